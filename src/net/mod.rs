//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum::serve accept loop
//!     → connection.rs (peer address + encryption flag as ConnectInfo)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Plaintext listener only; TLS is terminated in front of the gateway
//! - Connection facts are captured once per connection, read per request

pub mod connection;

pub use connection::ClientConnection;
