//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, access log, CORS, timeout)
//!     → /health (response.rs, never authenticated)
//!     → middleware/auth.rs (bearer check per route group)
//!     → proxy handler (strip prefix, forward upstream)
//!     → response.rs (JSON errors for gateway-generated failures)
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use response::{error_response, ErrorBody};
pub use server::{build_router, GatewayServer, HEALTH_PATH};
