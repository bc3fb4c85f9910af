//! Service name to proxy lookup.
//!
//! Built once at startup from the validated target set and never mutated:
//! there are no `&mut self` methods, so sharing it behind an `Arc` needs no
//! locking.

use std::collections::HashMap;
use std::time::Duration;

use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::proxy::forward::ReverseProxy;
use crate::proxy::target::Target;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no proxy targets configured")]
    NoTargets,

    #[error("duplicate proxy target: {0}")]
    DuplicateTarget(String),
}

#[derive(Debug)]
pub struct ProxyRegistry {
    proxies: HashMap<String, ReverseProxy>,
}

impl ProxyRegistry {
    /// One proxy per target, all sharing a single connection pool.
    pub fn build(targets: Vec<Target>, timeout: Duration) -> Result<Self, RegistryError> {
        if targets.is_empty() {
            return Err(RegistryError::NoTargets);
        }

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let mut proxies = HashMap::with_capacity(targets.len());

        for target in targets {
            let name = target.name().to_string();
            if proxies.contains_key(&name) {
                return Err(RegistryError::DuplicateTarget(name));
            }

            tracing::info!(
                service = %name,
                target = %target.url(),
                timeout_ms = timeout.as_millis() as u64,
                "Registered proxy target"
            );
            proxies.insert(name, ReverseProxy::new(target, client.clone(), timeout));
        }

        Ok(Self { proxies })
    }

    pub fn get(&self, name: &str) -> Option<&ReverseProxy> {
        self.proxies.get(name)
    }

    /// All service names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.proxies.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(entries: &[(&str, &str)]) -> Vec<Target> {
        entries
            .iter()
            .map(|(name, url)| Target::parse(name, url).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn empty_target_set_is_rejected() {
        let err = ProxyRegistry::build(Vec::new(), Duration::from_secs(30)).unwrap_err();
        assert_eq!(err, RegistryError::NoTargets);
    }

    #[tokio::test]
    async fn lookup_and_names() {
        let registry = ProxyRegistry::build(
            targets(&[("crm", "http://crm:8081"), ("billing", "http://billing:8083")]),
            Duration::from_secs(30),
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["billing", "crm"]);
        assert_eq!(
            registry.get("crm").unwrap().target().url().as_str(),
            "http://crm:8081/"
        );
        assert!(registry.get("cbs").is_none());
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let err = ProxyRegistry::build(
            targets(&[("crm", "http://a"), ("CRM", "http://b")]),
            Duration::from_secs(30),
        )
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTarget("crm".into()));
    }
}
