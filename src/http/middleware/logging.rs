//! Access log middleware.
//!
//! One `info` record per request, emitted after the response is produced, so
//! health checks, preflights and auth rejections are all covered.

use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthenticatedUser;
use crate::net::ClientConnection;
use crate::observability::metrics;
use crate::security::headers::{X_FORWARDED_FOR, X_REAL_IP};

pub async fn access_log(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let connection = req
        .extensions()
        .get::<ConnectInfo<ClientConnection>>()
        .map(|ConnectInfo(conn)| *conn);
    let client_ip = client_ip(req.headers(), connection.as_ref());
    let user_agent = header_str(req.headers(), header::USER_AGENT.as_str()).to_string();
    let request_id = header_str(req.headers(), "x-request-id").to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let user_id = response
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.0.as_str())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        path = %path,
        status,
        latency_ms = start.elapsed().as_millis() as u64,
        client_ip = %client_ip,
        user_agent = %user_agent,
        request_id = %request_id,
        user_id = %user_id,
        "Request completed"
    );
    metrics::record_request(method.as_str(), status, start);

    response
}

/// Client address for logging: first X-Forwarded-For hop, then X-Real-IP,
/// then the socket peer.
pub fn client_ip(headers: &HeaderMap, connection: Option<&ClientConnection>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    connection
        .map(|conn| conn.ip().to_string())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
