//! Role checks over validated claims.
//!
//! Comparison is exact and case-sensitive. An empty requirement list is
//! satisfied by any present claims; absent claims always fail.

use crate::auth::claims::Claims;
use crate::auth::error::AuthError;

const NO_CLAIMS: &str = "no claims provided";
const INSUFFICIENT: &str = "insufficient permissions";

pub fn require_role(claims: Option<&Claims>, role: &str) -> Result<(), AuthError> {
    let claims = claims.ok_or_else(|| AuthError::forbidden(NO_CLAIMS))?;
    if claims.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::forbidden(INSUFFICIENT))
    }
}

pub fn require_any_role(claims: Option<&Claims>, roles: &[&str]) -> Result<(), AuthError> {
    let claims = claims.ok_or_else(|| AuthError::forbidden(NO_CLAIMS))?;
    if roles.is_empty() || roles.iter().any(|r| claims.has_role(r)) {
        Ok(())
    } else {
        Err(AuthError::forbidden(INSUFFICIENT))
    }
}

pub fn require_all_roles(claims: Option<&Claims>, roles: &[&str]) -> Result<(), AuthError> {
    let claims = claims.ok_or_else(|| AuthError::forbidden(NO_CLAIMS))?;
    if roles.iter().all(|r| claims.has_role(r)) {
        Ok(())
    } else {
        Err(AuthError::forbidden(INSUFFICIENT))
    }
}
