//! Startup orchestration.
//!
//! # Responsibilities
//! - Name every way startup can fail
//! - Bind the listener once the rest of the gateway is ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::io;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::TokenError;
use crate::config::{ConfigError, ListenerConfig};
use crate::proxy::{RegistryError, TargetError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid proxy target: {0}")]
    Target(#[from] TargetError),

    #[error("failed to build proxy registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to create token manager: {0}")]
    Token(#[from] TokenError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Listening for connections");
    }
    Ok(listener)
}
