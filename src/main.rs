//! API gateway binary.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!   Client request       │                 API GATEWAY                   │
//!   ─────────────────────┼─▶ request id → trace → access log → CORS      │
//!                        │        │                                      │
//!                        │        ├─ /health ─────────────▶ "OK"         │
//!                        │        │                                      │
//!                        │        └─ /{service}/* or /* ─▶ bearer auth   │
//!                        │                                   │           │
//!                        │                    strip prefix, rewrite      │
//!                        │                    forwarding headers         │
//!                        │                                   │           │
//!   Client response      │                                   ▼           │
//!   ◀────────────────────┼──────────── relay / 502 / 504 ◀─ upstream ◀───┼── Backend
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_gateway::config::load_config;
use api_gateway::lifecycle::{bind_listener, wait_for_signal, Shutdown, StartupError};
use api_gateway::observability::{init_logging, metrics};
use api_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Authenticating reverse-proxy gateway", long_about = None)]
struct Cli {
    /// TOML configuration file. Without it, defaults plus environment are used.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the file, so it is not up yet.
            eprintln!("api-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("api-gateway: failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: api_gateway::GatewayConfig) -> Result<(), StartupError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        proxy_timeout_secs = config.proxy.timeout_secs,
        request_timeout_secs = config.server.request_timeout_secs,
        targets = config.proxy.targets.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener_config = config.listener.clone();
    let server = GatewayServer::new(config)?;
    let listener = bind_listener(&listener_config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(signal, "Shutdown signal received");
                shutdown.trigger();
            }
            Err(e) => {
                // Keep serving; the coordinator must outlive the server.
                tracing::error!(error = %e, "Failed to listen for shutdown signals");
                std::future::pending::<()>().await;
            }
        }
    });

    match server_task.await {
        Ok(result) => result,
        Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
    }
}
