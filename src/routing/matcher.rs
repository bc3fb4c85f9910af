//! Service prefix matching and stripping.
//!
//! # Design Decisions
//! - A prefix matches on a segment boundary only (`/crm` does not match `/crmx`)
//! - Matching is case-sensitive; service names are already lower-case
//! - The query string survives stripping untouched

use axum::http::{uri::PathAndQuery, Uri};

/// The `/{name}` prefix that selects a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrefix {
    service: String,
    prefix: String,
}

impl ServicePrefix {
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let prefix = format!("/{service}");
        Self { service, prefix }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// `/{name}`, as registered with the router.
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Path with the prefix removed; an empty remainder becomes `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if !self.matches(path) {
            return None;
        }
        let rest = &path[self.prefix.len()..];
        Some(if rest.is_empty() { "/" } else { rest })
    }

    /// Rewrite a request URI to the stripped path, keeping the query.
    pub fn strip_uri(&self, uri: &Uri) -> Option<Uri> {
        let path = self.strip(uri.path())?;
        let path_and_query = match uri.query() {
            Some(q) => format!("{path}?{q}"),
            None => path.to_string(),
        };

        let mut parts = uri.clone().into_parts();
        parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
        Uri::from_parts(parts).ok()
    }
}
