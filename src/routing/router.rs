//! Dispatch plan derived from the configured service names.
//!
//! # Responsibilities
//! - Decide which services get `/{name}` prefix routes
//! - Decide which service, if any, receives unmatched paths
//!
//! # Design Decisions
//! - Computed once at startup, immutable afterwards
//! - Named services always get prefixes; `default` is only ever the fallback
//! - Prefixes are tried before the fallback, so `default` never shadows them

use crate::proxy::DEFAULT_TARGET;
use crate::routing::matcher::ServicePrefix;

/// How a target set maps onto routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Only `default`: every path goes to it unchanged.
    Single,
    /// Only named services: prefix routes, unmatched paths are 404.
    Multi,
    /// Named services plus `default` as the catch-all.
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    prefixes: Vec<ServicePrefix>,
    fallback: Option<String>,
}

impl DispatchPlan {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut prefixes = Vec::new();
        let mut fallback = None;

        for name in names {
            let name = name.as_ref();
            if name == DEFAULT_TARGET {
                fallback = Some(name.to_string());
            } else {
                prefixes.push(ServicePrefix::new(name));
            }
        }
        prefixes.sort_by(|a, b| a.service().cmp(b.service()));

        Self { prefixes, fallback }
    }

    pub fn mode(&self) -> DispatchMode {
        match (self.prefixes.is_empty(), self.fallback.is_some()) {
            (true, _) => DispatchMode::Single,
            (false, false) => DispatchMode::Multi,
            (false, true) => DispatchMode::Mixed,
        }
    }

    pub fn prefixes(&self) -> &[ServicePrefix] {
        &self.prefixes
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }
}
