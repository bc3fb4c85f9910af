//! HMAC-signed bearer tokens.
//!
//! # Validation order
//! ```text
//! token string
//!     → empty?                          EmptyToken
//!     → header alg outside HS256/384/512  InvalidSigningMethod
//!     → signature / structure / nbf      InvalidToken
//!     → exp in the past                  Expired
//!     → iss != configured issuer         InvalidClaims
//!     → configured aud not in aud set    InvalidClaims
//!     → empty sub                        InvalidClaims
//! ```
//!
//! Refresh is the only path that tolerates an expired token. It still
//! verifies the signature and the issuer/audience.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use uuid::Uuid;

use crate::auth::claims::{Audience, Claims, Metadata};
use crate::auth::error::TokenError;

pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_ISSUER: &str = "api-gateway";
pub const DEFAULT_AUDIENCE: &str = "api-gateway";

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Settings for a [`TokenManager`].
#[derive(Clone, Default)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Lifetime of issued tokens. Zero means [`DEFAULT_EXPIRATION`].
    pub expiration: Duration,
    /// Clock skew tolerated on `exp` and `nbf`.
    pub leeway: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration", &self.expiration)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

/// Issues and validates signed bearer tokens.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenManager {
    issuer: String,
    audience: String,
    expiration: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    strict: Validation,
    relaxed: Validation,
}

impl fmt::Debug for TokenManager {
    // Key material stays out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Build a manager, filling unset issuer/audience/expiration with defaults.
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let expiration = if config.expiration.is_zero() {
            DEFAULT_EXPIRATION
        } else {
            config.expiration
        };
        let issuer = non_empty_or(config.issuer, DEFAULT_ISSUER);
        let audience = non_empty_or(config.audience, DEFAULT_AUDIENCE);

        // Issuer and audience are checked by hand after decoding so that their
        // failures are reported as claim errors, not parser errors.
        let mut strict = Validation::new(SIGNING_ALGORITHM);
        strict.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        strict.validate_exp = true;
        strict.validate_nbf = true;
        strict.validate_aud = false;
        strict.leeway = config.leeway.as_secs();

        let mut relaxed = strict.clone();
        relaxed.validate_exp = false;
        relaxed.validate_nbf = false;
        relaxed.required_spec_claims = HashSet::new();

        Ok(Self {
            issuer,
            audience,
            expiration,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            strict,
            relaxed,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Issue a token for `user_id` carrying `metadata`.
    pub fn issue(&self, user_id: &str, metadata: Metadata) -> Result<String, TokenError> {
        if user_id.is_empty() {
            return Err(TokenError::EmptyUserId);
        }

        let claims = Claims {
            metadata,
            ..Claims::for_user(user_id)
        };
        self.issue_with_claims(claims)
    }

    /// Issue a token from caller-supplied claims.
    ///
    /// Unset issuer, audience, expiry, issued-at, not-before and token id are
    /// filled from this manager; anything already set is kept as-is.
    pub fn issue_with_claims(&self, mut claims: Claims) -> Result<String, TokenError> {
        if claims.user_id.is_empty() {
            return Err(TokenError::EmptyUserId);
        }

        let now = now_secs();
        if claims.issuer.as_deref().map_or(true, str::is_empty) {
            claims.issuer = Some(self.issuer.clone());
        }
        if claims.audience.is_empty() {
            claims.audience = Audience::new([self.audience.as_str()]);
        }
        claims.expires_at.get_or_insert(now + self.expiration.as_secs());
        claims.issued_at.get_or_insert(now);
        claims.not_before.get_or_insert(now);
        if claims.token_id.is_none() {
            claims.token_id = Some(Uuid::new_v4().to_string());
        }

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode_with(token, &self.strict)?;
        self.check_claims(&claims)?;
        Ok(claims)
    }

    /// Re-issue a token with the same claims and a fresh validity window.
    ///
    /// Accepts expired tokens; rejects anything else `validate` would reject.
    pub fn refresh(&self, token: &str) -> Result<String, TokenError> {
        let mut claims = match self.validate(token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => {
                let claims = self.decode_with(token, &self.relaxed)?;
                self.check_claims(&claims)?;
                claims
            }
            Err(e) => return Err(e),
        };

        claims.expires_at = None;
        claims.issued_at = None;
        claims.not_before = None;
        claims.token_id = None;
        self.issue_with_claims(claims)
    }

    /// Best-effort user id for audit logging. Empty on any failure.
    ///
    /// Checks the signature but not expiry, issuer or audience, so the result
    /// must never be used to grant access.
    pub fn extract_user_id(&self, token: &str) -> String {
        self.decode_with(token, &self.relaxed)
            .map(|claims| claims.user_id)
            .unwrap_or_default()
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::EmptyToken);
        }

        let header = decode_header(token).map_err(TokenError::InvalidToken)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::InvalidSigningMethod(format!("{:?}", header.alg)));
        }

        decode::<Claims>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSigningMethod(format!("{:?}", header.alg))
                }
                _ => TokenError::InvalidToken(e),
            })
    }

    fn check_claims(&self, claims: &Claims) -> Result<(), TokenError> {
        if claims.issuer.as_deref() != Some(self.issuer.as_str()) {
            return Err(TokenError::InvalidClaims("invalid issuer"));
        }
        if !claims.audience.contains(&self.audience) {
            return Err(TokenError::InvalidClaims("invalid audience"));
        }
        if claims.user_id.is_empty() {
            return Err(TokenError::InvalidClaims("missing subject"));
        }
        Ok(())
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::MetadataValue;

    const SECRET: &str = "test-secret-key-for-unit-tests";

    fn manager() -> TokenManager {
        TokenManager::new(TokenConfig {
            secret: SECRET.into(),
            issuer: "gateway-test".into(),
            audience: "test-audience".into(),
            expiration: Duration::from_secs(3600),
            leeway: Duration::ZERO,
        })
        .unwrap()
    }

    fn expired_claims(user_id: &str) -> Claims {
        let past = now_secs() - 7200;
        Claims {
            expires_at: Some(past + 3600),
            issued_at: Some(past),
            not_before: Some(past),
            ..Claims::for_user(user_id)
        }
    }

    #[test]
    fn new_applies_defaults() {
        let m = TokenManager::new(TokenConfig {
            secret: SECRET.into(),
            ..TokenConfig::default()
        })
        .unwrap();

        assert_eq!(m.issuer(), DEFAULT_ISSUER);
        assert_eq!(m.audience(), DEFAULT_AUDIENCE);
        assert_eq!(m.expiration(), DEFAULT_EXPIRATION);
    }

    #[test]
    fn new_rejects_empty_secret() {
        let err = TokenManager::new(TokenConfig::default()).unwrap_err();
        assert!(matches!(err, TokenError::MissingSecret));
    }

    #[test]
    fn issued_token_validates_with_same_subject_and_metadata() {
        let m = manager();
        let mut metadata = Metadata::new();
        metadata.insert("tier".into(), MetadataValue::from(2i64));
        metadata.insert("region".into(), MetadataValue::from("eu"));

        let token = m.issue("user123", metadata.clone()).unwrap();
        let claims = m.validate(&token).unwrap();

        assert_eq!(claims.user_id, "user123");
        assert_eq!(claims.subject(), "user123");
        assert_eq!(claims.metadata, metadata);
        assert_eq!(claims.issuer.as_deref(), Some("gateway-test"));
        assert!(claims.audience.contains("test-audience"));
        assert!(claims.token_id.is_some());

        let exp = claims.expires_at.unwrap();
        let iat = claims.issued_at.unwrap();
        assert_eq!(exp - iat, 3600);
    }

    #[test]
    fn issue_rejects_empty_user_id() {
        let m = manager();
        assert!(matches!(m.issue("", Metadata::new()), Err(TokenError::EmptyUserId)));
        assert!(matches!(
            m.issue_with_claims(Claims::default()),
            Err(TokenError::EmptyUserId)
        ));
    }

    #[test]
    fn issue_with_claims_keeps_caller_values() {
        let m = manager();
        let claims = Claims {
            username: Some("jdoe".into()),
            email: Some("jdoe@example.com".into()),
            ..Claims::for_user("u-1").with_roles(["admin"])
        };

        let decoded = m.validate(&m.issue_with_claims(claims).unwrap()).unwrap();
        assert_eq!(decoded.username.as_deref(), Some("jdoe"));
        assert_eq!(decoded.email.as_deref(), Some("jdoe@example.com"));
        assert!(decoded.has_role("admin"));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let m = manager();
        let token = m.issue_with_claims(expired_claims("user123")).unwrap();
        assert!(matches!(m.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(manager().validate(""), Err(TokenError::EmptyToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            manager().validate("not-a-token"),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let other = TokenManager::new(TokenConfig {
            secret: "another-secret".into(),
            issuer: "gateway-test".into(),
            audience: "test-audience".into(),
            ..TokenConfig::default()
        })
        .unwrap();
        let token = other.issue("user123", Metadata::new()).unwrap();

        assert!(matches!(manager().validate(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn none_algorithm_is_rejected() {
        // {"alg":"none","typ":"JWT"} . {"sub":"attacker","iss":"gateway-test","aud":"test-audience","exp":9999999999} .
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
            eyJzdWIiOiJhdHRhY2tlciIsImlzcyI6ImdhdGV3YXktdGVzdCIsImF1ZCI6InRlc3QtYXVkaWVuY2UiLCJleHAiOjk5OTk5OTk5OTl9.";
        assert!(manager().validate(token).is_err());
    }

    #[test]
    fn asymmetric_algorithm_is_rejected() {
        // {"alg":"RS256","typ":"JWT"} with an HMAC-looking signature
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.\
            eyJzdWIiOiJhdHRhY2tlciIsImlzcyI6ImdhdGV3YXktdGVzdCIsImF1ZCI6InRlc3QtYXVkaWVuY2UiLCJleHAiOjk5OTk5OTk5OTl9.\
            c2lnbmF0dXJl";
        assert!(matches!(
            manager().validate(token),
            Err(TokenError::InvalidSigningMethod(_))
        ));
    }

    #[test]
    fn other_hmac_strengths_are_accepted() {
        let m = manager();
        let claims = Claims {
            issuer: Some("gateway-test".into()),
            audience: Audience::new(["test-audience"]),
            expires_at: Some(now_secs() + 600),
            ..Claims::for_user("user123")
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(m.validate(&token).unwrap().user_id, "user123");
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let m = manager();
        let claims = Claims {
            issuer: Some("someone-else".into()),
            ..Claims::for_user("user123")
        };
        let token = m.issue_with_claims(claims).unwrap();

        assert!(matches!(
            m.validate(&token),
            Err(TokenError::InvalidClaims("invalid issuer"))
        ));
    }

    #[test]
    fn audience_must_contain_configured_value() {
        let m = manager();

        let foreign = Claims {
            audience: Audience::new(["billing", "crm"]),
            ..Claims::for_user("user123")
        };
        let token = m.issue_with_claims(foreign).unwrap();
        assert!(matches!(
            m.validate(&token),
            Err(TokenError::InvalidClaims("invalid audience"))
        ));

        let shared = Claims {
            audience: Audience::new(["billing", "test-audience"]),
            ..Claims::for_user("user123")
        };
        let token = m.issue_with_claims(shared).unwrap();
        assert!(m.validate(&token).is_ok());
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let m = manager();
        let claims = Claims {
            not_before: Some(now_secs() + 600),
            ..Claims::for_user("user123")
        };
        let token = m.issue_with_claims(claims).unwrap();
        assert!(matches!(m.validate(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn refresh_accepts_expired_token() {
        let m = manager();
        let expired = m.issue_with_claims(expired_claims("user123")).unwrap();

        let refreshed = m.refresh(&expired).unwrap();
        let claims = m.validate(&refreshed).unwrap();

        assert_eq!(claims.user_id, "user123");
        assert!(claims.expires_at.unwrap() > now_secs());
    }

    #[test]
    fn refresh_carries_claims_and_renews_window() {
        let m = manager();
        let original = Claims {
            email: Some("a@example.com".into()),
            ..Claims::for_user("user123").with_roles(["ops"])
        };
        let token = m.issue_with_claims(original).unwrap();
        let before = m.validate(&token).unwrap();

        let after = m.validate(&m.refresh(&token).unwrap()).unwrap();
        assert_eq!(after.email, before.email);
        assert_eq!(after.roles, before.roles);
        assert_ne!(after.token_id, before.token_id);
    }

    #[test]
    fn refresh_rejects_bad_signature() {
        let other = TokenManager::new(TokenConfig {
            secret: "another-secret".into(),
            issuer: "gateway-test".into(),
            audience: "test-audience".into(),
            ..TokenConfig::default()
        })
        .unwrap();
        let forged = other.issue_with_claims(expired_claims("user123")).unwrap();

        assert!(matches!(manager().refresh(&forged), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn refresh_rejects_expired_token_for_another_issuer() {
        let m = manager();
        let claims = Claims {
            issuer: Some("someone-else".into()),
            ..expired_claims("user123")
        };
        let token = m.issue_with_claims(claims).unwrap();

        assert!(matches!(m.refresh(&token), Err(TokenError::InvalidClaims(_))));
    }

    #[test]
    fn extract_user_id_ignores_expiry_but_not_signature() {
        let m = manager();
        let expired = m.issue_with_claims(expired_claims("user123")).unwrap();
        assert_eq!(m.extract_user_id(&expired), "user123");

        assert_eq!(m.extract_user_id("garbage"), "");
        assert_eq!(m.extract_user_id(""), "");
    }
}
