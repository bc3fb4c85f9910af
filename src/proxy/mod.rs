//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! validated targets (name -> http origin)
//!     → target.rs (parse, lower-case names)
//!     → registry.rs (one ReverseProxy per target, frozen)
//!     → forward.rs (rewrite, forward once, 502/504 on failure)
//!     → deadline.rs (response body bounded by the same deadline)
//! ```

pub mod deadline;
pub mod forward;
pub mod registry;
pub mod target;

pub use forward::{HttpClient, ReverseProxy};
pub use registry::{ProxyRegistry, RegistryError};
pub use target::{Target, TargetError, DEFAULT_TARGET};
