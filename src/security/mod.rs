//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin policy, preflight short-circuit)
//!     → [auth middleware]
//!     → headers.rs (forwarding headers from the socket, hop-by-hop removal)
//!     → Forward upstream
//! ```
//!
//! # Design Decisions
//! - No trust in client-supplied forwarding or identity headers
//! - Preflights never reach authentication

pub mod cors;
pub mod headers;

pub use cors::CorsPolicy;
