//! Forwarding one request to one upstream.
//!
//! # Responsibilities
//! - Rewrite the URI onto the upstream origin (base path joined, queries merged)
//! - Enforce the header trust boundary and set Host to the upstream authority
//! - Bound the round-trip, body included, with the configured deadline
//! - Map failures to 504 (deadline) or 502 (anything else)
//!
//! # Design Decisions
//! - Exactly one attempt per inbound request
//! - One deadline covers connect, response head and the streamed body
//! - Outbound requests are always HTTP/1.1

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, uri::PathAndQuery, HeaderValue, Request, StatusCode, Uri, Version},
    response::Response,
};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::auth::AuthContext;
use crate::http::response::error_response;
use crate::net::ClientConnection;
use crate::observability::metrics;
use crate::proxy::deadline::DeadlineBody;
use crate::proxy::target::Target;
use crate::security::headers::{set_forwarded_headers, set_user_header, strip_hop_by_hop};

/// Shared outbound HTTP client.
pub type HttpClient = Client<HttpConnector, Body>;

/// Proxy bound to a single upstream target.
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    target: Target,
    client: HttpClient,
    timeout: Duration,
}

impl ReverseProxy {
    pub fn new(target: Target, client: HttpClient, timeout: Duration) -> Self {
        Self {
            target,
            client,
            timeout,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forward `request` upstream and relay the answer.
    ///
    /// The request path must already be the path the upstream should see.
    pub async fn forward(&self, request: Request<Body>, conn: &ClientConnection) -> Response {
        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let service = self.target.name();

        let (mut parts, body) = request.into_parts();

        let original_host = parts.headers.get(header::HOST).cloned().or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
        let user_id = parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| ctx.user_id.clone());

        strip_hop_by_hop(&mut parts.headers);
        set_forwarded_headers(&mut parts.headers, conn, original_host);
        set_user_header(&mut parts.headers, user_id.as_deref());

        let uri = match self.upstream_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    target = %self.target.url(),
                    service = %service,
                    error = %e,
                    "Failed to build upstream uri"
                );
                metrics::record_upstream_error(service, "uri");
                return error_response(StatusCode::BAD_GATEWAY, "bad gateway");
            }
        };

        match HeaderValue::from_str(&self.target.authority()) {
            Ok(host) => {
                parts.headers.insert(header::HOST, host);
            }
            Err(_) => {
                parts.headers.remove(header::HOST);
            }
        }

        parts.uri = uri;
        parts.version = Version::HTTP_11;
        let outbound = Request::from_parts(parts, body);

        match tokio::time::timeout_at(deadline, self.client.request(outbound)).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    target = %self.target.url(),
                    service = %service,
                    status = response.status().as_u16(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                relay(response, deadline, service)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    target = %self.target.url(),
                    service = %service,
                    error = %e,
                    "Upstream request failed"
                );
                metrics::record_upstream_error(service, "transport");
                error_response(StatusCode::BAD_GATEWAY, "bad gateway")
            }
            Err(_) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    target = %self.target.url(),
                    service = %service,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Upstream request timed out"
                );
                metrics::record_upstream_error(service, "timeout");
                error_response(StatusCode::GATEWAY_TIMEOUT, "gateway timeout")
            }
        }
    }

    /// Absolute upstream URI for an inbound request URI.
    pub fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let base = self.target.url();
        let path = join_paths(base.path(), inbound.path());
        let query = match (base.query().filter(|q| !q.is_empty()), inbound.query()) {
            (Some(a), Some(b)) if !b.is_empty() => Some(format!("{a}&{b}")),
            (Some(a), _) => Some(a.to_string()),
            (None, Some(b)) if !b.is_empty() => Some(b.to_string()),
            _ => None,
        };

        let path_and_query = match query {
            Some(q) => format!("{path}?{q}"),
            None => path,
        };

        Uri::builder()
            .scheme(base.scheme())
            .authority(self.target.authority().as_str())
            .path_and_query(PathAndQuery::try_from(path_and_query)?)
            .build()
    }
}

/// Hand an upstream response back to the client, minus hop-by-hop headers.
/// The body keeps streaming until `deadline`.
fn relay(
    response: hyper::Response<Incoming>,
    deadline: tokio::time::Instant,
    service: &str,
) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(DeadlineBody::new(body, deadline, service)))
}

/// Join two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    let base_slash = base.ends_with('/');
    let path_slash = path.starts_with('/');
    let joined = match (base_slash, path_slash) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    };
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}
