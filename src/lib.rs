//! Authenticating HTTP reverse-proxy gateway library.
//!
//! Clients present a bearer token; the gateway validates it and forwards the
//! request to the backend selected by its path prefix (or to the single
//! `default` backend), rewriting forwarding headers from the real connection.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
