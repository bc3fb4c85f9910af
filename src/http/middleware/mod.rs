//! Request middleware.
//!
//! ```text
//! logging.rs  access log + request metrics (outermost of the two)
//! auth.rs     bearer authentication, applied per route group
//! ```

pub mod auth;
pub mod logging;

pub use auth::require_auth;
pub use logging::access_log;
