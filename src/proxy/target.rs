//! Upstream target definitions.

use thiserror::Error;
use url::Url;

/// Name used for the catch-all target.
pub const DEFAULT_TARGET: &str = "default";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target name must not be empty")]
    EmptyName,

    #[error("target {name}: invalid url {url:?}: {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("target {name}: unsupported scheme {scheme:?} (only http is supported)")]
    UnsupportedScheme { name: String, scheme: String },

    #[error("target {name}: url has no host")]
    MissingHost { name: String },
}

/// A named upstream origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    url: Url,
}

impl Target {
    /// Parse a target. The name is lower-cased.
    pub fn parse(name: &str, url: &str) -> Result<Self, TargetError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(TargetError::EmptyName);
        }

        let parsed = Url::parse(url.trim()).map_err(|e| TargetError::InvalidUrl {
            name: name.clone(),
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "http" {
            return Err(TargetError::UnsupportedScheme {
                name,
                scheme: parsed.scheme().to_string(),
            });
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(TargetError::MissingHost { name });
        }

        Ok(Self { name, url: parsed })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_TARGET
    }

    /// `host[:port]` as it should appear in the outbound Host header.
    pub fn authority(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}
