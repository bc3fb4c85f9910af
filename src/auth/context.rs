//! Per-request identity attached by the auth middleware.
//!
//! The middleware inserts [`AuthContext`] into the request extensions before
//! delegating, and [`AuthenticatedUser`] into the response extensions on the
//! way out so outer layers (access log) can report who made the call. Both
//! live exactly as long as the request/response they are attached to.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::claims::Claims;
use crate::auth::error::AuthError;

/// Validated identity of the caller.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub claims: Arc<Claims>,
}

impl AuthContext {
    pub fn new(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id.clone(),
            claims: Arc::new(claims),
        }
    }
}

/// User id copied onto the response for logging.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AuthError::unauthorized("unauthorized"))
    }
}
