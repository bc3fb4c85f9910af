//! Bearer authentication middleware.
//!
//! Rejected requests never reach the wrapped handler. Accepted requests carry
//! an [`AuthContext`] in their extensions, and the response carries the user
//! id back out for the access log.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::auth::{AuthContext, AuthError, AuthenticatedUser, Authenticator};
use crate::observability::metrics;

pub async fn require_auth(
    State(authenticator): State<Arc<Authenticator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let header = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value.to_string()),
            Err(_) => {
                return reject(
                    &authenticator,
                    &req,
                    None,
                    AuthError::unauthorized("invalid authorization header format"),
                )
            }
        },
    };

    match authenticator.authenticate(header.as_deref()) {
        Ok(claims) => {
            let ctx = AuthContext::new(claims);
            let user_id = ctx.user_id.clone();
            req.extensions_mut().insert(ctx);

            let mut response = next.run(req).await;
            response
                .extensions_mut()
                .insert(AuthenticatedUser(user_id));
            response
        }
        Err(err) => reject(&authenticator, &req, header.as_deref(), err),
    }
}

fn reject(
    authenticator: &Authenticator,
    req: &Request<Body>,
    header: Option<&str>,
    err: AuthError,
) -> Response {
    warn!(
        path = %req.uri().path(),
        method = %req.method(),
        error = %err,
        user_id = %authenticator.audit_user_id(header),
        "Authentication failed"
    );
    metrics::record_auth_failure(err.message());
    err.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Metadata, TokenConfig, TokenManager};
    use axum::{
        http::{HeaderValue, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn manager() -> Arc<TokenManager> {
        Arc::new(
            TokenManager::new(TokenConfig {
                secret: "test-secret".into(),
                ..TokenConfig::default()
            })
            .unwrap(),
        )
    }

    fn app(authenticator: Authenticator) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|ctx: AuthContext| async move { ctx.user_id }),
            )
            .route_layer(middleware::from_fn_with_state(
                Arc::new(authenticator),
                require_auth,
            ))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_rejected_with_json() {
        let response = app(Authenticator::Ready(manager()))
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"missing authorization header"}"#
        );
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let manager = manager();
        let token = manager.issue("user123", Metadata::new()).unwrap();

        let response = app(Authenticator::Ready(manager))
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .extensions()
                .get::<AuthenticatedUser>()
                .map(|u| u.0.as_str()),
            Some("user123")
        );
        assert_eq!(body_string(response).await, "user123");
    }

    #[tokio::test]
    async fn non_utf8_header_is_malformed() {
        let response = app(Authenticator::Ready(manager()))
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(
                        header::AUTHORIZATION,
                        HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"invalid authorization header format"}"#
        );
    }

    #[tokio::test]
    async fn unavailable_authenticator_is_internal_error() {
        let response = app(Authenticator::Unavailable)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Bearer whatever")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"internal server error"}"#
        );
    }
}
