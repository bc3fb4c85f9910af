//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → bearer.rs (extract token, distinct failure per malformation)
//!     → token.rs (signature, algorithm family, expiry, issuer, audience)
//!     → Claims (trusted)
//!     → context.rs (AuthContext in request extensions)
//!     → roles.rs (optional role checks by downstream handlers)
//! ```
//!
//! # Design Decisions
//! - HMAC only; any other `alg` is rejected before signature checks
//! - Every failure becomes an `AuthError` whose message is safe to return
//! - The token manager is built once and shared read-only

pub mod bearer;
pub mod claims;
pub mod context;
pub mod error;
pub mod roles;
pub mod token;

use std::sync::Arc;

pub use bearer::extract_bearer_token;
pub use claims::{Audience, Claims, Metadata, MetadataValue};
pub use context::{AuthContext, AuthenticatedUser};
pub use error::{AuthError, TokenError};
pub use roles::{require_all_roles, require_any_role, require_role};
pub use token::{TokenConfig, TokenManager};

/// Request authenticator used by the auth middleware.
///
/// `Unavailable` answers every request with a 500 instead of panicking when
/// no token manager could be built.
#[derive(Debug, Clone)]
pub enum Authenticator {
    Ready(Arc<TokenManager>),
    Unavailable,
}

impl Authenticator {
    /// Validate the raw `Authorization` header value and return trusted claims.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let manager = match self {
            Authenticator::Ready(m) => m,
            Authenticator::Unavailable => return Err(AuthError::internal()),
        };

        let token = extract_bearer_token(header)?;
        manager.validate(token).map_err(AuthError::from)
    }

    /// Unverified user id for logging rejected requests.
    pub fn audit_user_id(&self, header: Option<&str>) -> String {
        match (self, extract_bearer_token(header)) {
            (Authenticator::Ready(m), Ok(token)) => m.extract_user_id(token),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::time::Duration;

    fn ready() -> (Authenticator, Arc<TokenManager>) {
        let manager = Arc::new(
            TokenManager::new(TokenConfig {
                secret: "s3cret".into(),
                expiration: Duration::from_secs(60),
                ..TokenConfig::default()
            })
            .unwrap(),
        );
        (Authenticator::Ready(manager.clone()), manager)
    }

    #[test]
    fn authenticates_valid_bearer() {
        let (auth, manager) = ready();
        let token = manager.issue("user123", Metadata::new()).unwrap();

        let claims = auth.authenticate(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(claims.user_id, "user123");
    }

    #[test]
    fn header_failures_are_unauthorized() {
        let (auth, _) = ready();
        let err = auth.authenticate(None).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "missing authorization header");

        let err = auth.authenticate(Some("Bearer nope")).unwrap_err();
        assert_eq!(err.message(), "invalid or expired token");
    }

    #[test]
    fn unavailable_manager_yields_internal_error() {
        assert!(TokenManager::new(TokenConfig::default()).is_err());

        let auth = Authenticator::Unavailable;
        let err = auth.authenticate(Some("Bearer anything")).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal server error");
    }

    #[test]
    fn audit_user_id_is_best_effort() {
        let (auth, manager) = ready();
        let token = manager.issue("user123", Metadata::new()).unwrap();

        assert_eq!(auth.audit_user_id(Some(&format!("Bearer {token}"))), "user123");
        assert_eq!(auth.audit_user_id(Some("Basic abc")), "");
        assert_eq!(auth.audit_user_id(None), "");
    }
}
