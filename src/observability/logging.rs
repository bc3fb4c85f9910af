//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable through `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, text format for development

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber. Errors if one is already installed.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => subscriber.with(fmt::layer().json()).try_init(),
        LogFormat::Text => subscriber.with(fmt::layer()).try_init(),
    }
}

/// Directives used when `RUST_LOG` is unset.
fn default_directives(level: &str) -> String {
    format!("api_gateway={level},tower_http={level}")
}
