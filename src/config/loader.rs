//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, TargetConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::proxy::DEFAULT_TARGET;

/// Services that can be configured through `<NAME>_SERVICE_URL`.
pub const WELL_KNOWN_SERVICES: [&str; 6] = ["CRM", "CBS", "BILLING", "AUTH", "NOTIFICATION", "PAYMENT"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides, and validate.
///
/// Without a path the built-in defaults are the starting point, so a gateway
/// can be configured from the environment alone.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values on top of `config`.
///
/// `PROXY_TARGET_URL` replaces the whole target set with a single `default`
/// target and takes precedence over the per-service variables.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(secret) = var("GATEWAY_JWT_SECRET") {
        config.jwt.secret = secret;
    }

    if let Some(url) = var("PROXY_TARGET_URL") {
        config.proxy.targets.clear();
        config
            .proxy
            .targets
            .insert(DEFAULT_TARGET.to_string(), TargetConfig { url });
        return;
    }

    for service in WELL_KNOWN_SERVICES {
        if let Some(url) = var(&format!("{service}_SERVICE_URL")) {
            config
                .proxy
                .targets
                .insert(service.to_lowercase(), TargetConfig { url });
        }
    }
}
