//! CORS policy for browser clients.
//!
//! # Responsibilities
//! - Match the request Origin against the allow-list (exact or `*`)
//! - Echo a permitted Origin and attach the policy headers
//! - Answer every OPTIONS request with 204 before auth or proxying
//!
//! # Design Decisions
//! - The permitted Origin is echoed even for `*`, so credentials keep working
//! - Non-matching origins get no Allow-Origin; the browser enforces the rest

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;

/// Precomputed CORS policy.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allow_credentials: bool,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            allow_credentials: config.allow_credentials,
            allow_methods: join_header(&config.allowed_methods),
            allow_headers: join_header(&config.allowed_headers),
            max_age: HeaderValue::from(config.max_age),
        }
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }

    /// Attach policy headers for `origin` to a response.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = origin {
            let permitted = origin
                .to_str()
                .map(|o| self.is_origin_allowed(o))
                .unwrap_or(false);
            if permitted {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            }
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }

        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

fn join_header(values: &[String]) -> HeaderValue {
    HeaderValue::from_str(&values.join(", ")).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Middleware applying the CORS policy and short-circuiting preflights.
pub async fn cors(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    policy.apply(origin.as_ref(), response.headers_mut());
    response
}
