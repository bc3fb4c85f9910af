//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Service names (at startup)
//!     → router.rs (DispatchPlan: prefix routes + optional fallback)
//!     → matcher.rs (ServicePrefix: segment-boundary match, strip)
//!     → axum routes registered by the HTTP server
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Prefix matching only, no regex
//! - Deterministic: same input always resolves to the same service

pub mod matcher;
pub mod router;

pub use matcher::ServicePrefix;
pub use router::{DispatchMode, DispatchPlan};
