//! `Authorization: Bearer <token>` parsing.

use crate::auth::error::AuthError;

/// Pull the token out of an `Authorization` header value.
///
/// `None` means the header was absent. The scheme is matched
/// case-insensitively; surrounding whitespace around the token is ignored.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(AuthError::unauthorized("missing authorization header")),
    };

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::unauthorized("invalid authorization header format"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::unauthorized(
            "invalid authorization scheme (expected Bearer)",
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::unauthorized("empty bearer token"));
    }

    Ok(token)
}
