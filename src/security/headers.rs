//! Header rewriting at the trust boundary.
//!
//! # Responsibilities
//! - Replace X-Real-IP, X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//!   with values observed on the connection
//! - Replace X-User-Id with the authenticated identity (or drop it)
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Client-supplied forwarding headers are discarded, never appended to
//! - Everything else, Authorization included, passes through unchanged

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::net::ClientConnection;

pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Overwrite the forwarding headers from the real connection.
///
/// `original_host` is the Host the client addressed; it becomes
/// X-Forwarded-Host. When absent the header is left unset.
pub fn set_forwarded_headers(
    headers: &mut HeaderMap,
    conn: &ClientConnection,
    original_host: Option<HeaderValue>,
) {
    headers.remove(X_REAL_IP);
    headers.remove(X_FORWARDED_FOR);
    headers.remove(X_FORWARDED_PROTO);
    headers.remove(X_FORWARDED_HOST);

    if let Ok(ip) = HeaderValue::try_from(conn.ip().to_string()) {
        headers.insert(X_REAL_IP, ip.clone());
        headers.insert(X_FORWARDED_FOR, ip);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(conn.scheme()));
    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST, host);
    }
}

/// Set X-User-Id to the authenticated user, or remove it when unauthenticated.
pub fn set_user_header(headers: &mut HeaderMap, user_id: Option<&str>) {
    headers.remove(X_USER_ID);
    if let Some(value) = user_id.and_then(|id| HeaderValue::try_from(id).ok()) {
        headers.insert(X_USER_ID, value);
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
