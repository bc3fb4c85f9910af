//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate target names and upstream URLs
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Refuse test-only switches in release builds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::proxy::Target;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("jwt.secret is required")]
    MissingJwtSecret,

    #[error("at least one proxy target is required")]
    NoTargets,

    #[error("proxy target {0:?}: name must match [a-z0-9_-]+")]
    InvalidTargetName(String),

    #[error("proxy target {0:?}: name is reserved")]
    ReservedTargetName(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("proxy.timeout_secs must be greater than zero")]
    ZeroProxyTimeout,

    #[error("server.request_timeout_secs ({server}) must be longer than proxy.timeout_secs ({proxy})")]
    RequestTimeoutTooShort { server: u64, proxy: u64 },

    #[error("invalid {field} {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("auth.skip_prefixed_routes is not available in release builds")]
    SkipAuthInRelease,
}

/// Names whose `/{name}` prefix would shadow a gateway route.
const RESERVED_TARGET_NAMES: [&str; 1] = ["health"];

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.jwt.secret.is_empty() {
        errors.push(ValidationError::MissingJwtSecret);
    }

    if config.proxy.targets.is_empty() {
        errors.push(ValidationError::NoTargets);
    }
    for (name, target) in &config.proxy.targets {
        if !is_valid_target_name(name) {
            errors.push(ValidationError::InvalidTargetName(name.clone()));
            continue;
        }
        if RESERVED_TARGET_NAMES.contains(&name.as_str()) {
            errors.push(ValidationError::ReservedTargetName(name.clone()));
        }
        if let Err(e) = Target::parse(name, &target.url) {
            errors.push(ValidationError::InvalidTarget(e.to_string()));
        }
    }

    if config.proxy.timeout_secs == 0 {
        errors.push(ValidationError::ZeroProxyTimeout);
    } else if config.server.request_timeout_secs <= config.proxy.timeout_secs {
        // The request clock starts before the proxy clock, so it must be the later of the two.
        errors.push(ValidationError::RequestTimeoutTooShort {
            server: config.server.request_timeout_secs,
            proxy: config.proxy.timeout_secs,
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.auth.skip_prefixed_routes && !cfg!(debug_assertions) {
        errors.push(ValidationError::SkipAuthInRelease);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_target_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}
