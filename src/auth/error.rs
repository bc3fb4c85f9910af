//! Authentication and authorization failures.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::error_response;

/// Failures produced by [`TokenManager`](super::TokenManager).
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token manager requires a non-empty secret")]
    MissingSecret,

    #[error("user id cannot be empty")]
    EmptyUserId,

    #[error("invalid token: empty token string")]
    EmptyToken,

    #[error("invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("token has expired")]
    Expired,

    #[error("invalid signing method: {0}")]
    InvalidSigningMethod(String),

    #[error("invalid token claims: {0}")]
    InvalidClaims(&'static str),

    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// An authentication or authorization failure, shaped for an HTTP response.
///
/// Only `status` and `message` reach the client. The wrapped cause is kept
/// for logs.
#[derive(Debug)]
pub struct AuthError {
    status: StatusCode,
    message: &'static str,
    source: Option<TokenError>,
}

impl AuthError {
    pub fn unauthorized(message: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message,
            source: None,
        }
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message,
            source: None,
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error",
            source: None,
        }
    }

    pub fn with_source(mut self, source: TokenError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        let message = match &err {
            TokenError::Expired => "token has expired",
            TokenError::InvalidSigningMethod(_) => "invalid token signing method",
            TokenError::InvalidClaims(_) => "invalid token claims",
            _ => "invalid or expired token",
        };
        AuthError::unauthorized(message).with_source(err)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The cause already names the failure; the client message is coarser.
        match &self.source {
            Some(source) => write!(f, "{source}"),
            None => f.write_str(self.message),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(self.status, self.message)
    }
}
