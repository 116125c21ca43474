// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and validation.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret that is injected
//! at construction and never changes afterwards.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{claims::TokenClaims, AuthError, Role};

/// The only algorithm accepted on validation.
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default validity window for issued tokens.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Upper bound on the validity window accepted from configuration.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

/// Issues and validates signed session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
    leeway_secs: u64,
}

impl TokenService {
    /// Create a token service from the signing secret and validity window.
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity,
            leeway_secs: 0,
        }
    }

    /// Allow some clock skew when checking expiry.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Issue a token for the given identity, valid from now.
    pub fn issue(&self, subject_id: &str, username: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(subject_id, username, role, Utc::now())
    }

    /// Issue a token with an explicit issued-at instant.
    pub fn issue_at(
        &self,
        subject_id: &str,
        username: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.validity)
            .ok_or_else(|| AuthError::InternalError("token expiry out of range".into()))?;
        let claims = TokenClaims {
            sub: subject_id.to_string(),
            username: username.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("Failed to sign token: {e}")))
    }

    /// Validate a token and return its claims.
    ///
    /// Every failure maps to [`AuthError::InvalidToken`]; the reason is only
    /// logged.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = self.leeway_secs;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "expired",
                    ErrorKind::InvalidSignature => "bad_signature",
                    ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                        "algorithm_mismatch"
                    }
                    ErrorKind::MissingRequiredClaim(_) => "missing_claim",
                    _ => "malformed",
                };
                tracing::debug!(reason, error = %e, "token rejected");
                AuthError::InvalidToken
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("validity_secs", &self.validity.num_seconds())
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"test-secret-key-minimum-32-characters-long";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    #[test]
    fn issue_then_validate_returns_claims() {
        let tokens = service();
        let token = tokens.issue("user-1", "alice", Role::User).unwrap();

        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let issued_at = Utc::now() - Duration::hours(25);
        let token = tokens.issue_at("user-1", "alice", Role::User, issued_at).unwrap();

        assert_eq!(tokens.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenService::new(b"another-secret-also-32-characters-long", Duration::hours(24));
        let token = other.issue("user-1", "alice", Role::Admin).unwrap();

        assert_eq!(service().validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_and_forged_tokens_are_indistinguishable() {
        let tokens = service();
        let expired = tokens
            .issue_at("user-1", "alice", Role::User, Utc::now() - Duration::days(2))
            .unwrap();
        let forged = TokenService::new(b"forged-secret-forged-secret-forged!", Duration::hours(24))
            .issue("user-1", "alice", Role::User)
            .unwrap();

        let a = tokens.validate(&expired).unwrap_err();
        let b = tokens.validate(&forged).unwrap_err();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let tokens = service();
        let claims = TokenClaims {
            sub: "user-1".into(),
            username: "alice".into(),
            role: Role::Admin,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let hs384 = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(tokens.validate(&hs384), Err(AuthError::InvalidToken));
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"user-1","username":"mallory","role":"admin","iat":1,"exp":{exp}}}"#
        ));
        let token = format!("{header}.{payload}.");

        assert_eq!(service().validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let tokens = service();
        let token = tokens.issue("user-1", "alice", Role::User).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let escalated = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"user-1","username":"alice","role":"admin","iat":1,"exp":{exp}}}"#
        ));
        let tampered = format!("{}.{}.{}", parts[0], escalated, parts[2]);

        assert_eq!(tokens.validate(&tampered), Err(AuthError::InvalidToken));
    }

    #[test]
    fn leeway_accepts_recently_expired_token() {
        let issued_at = Utc::now() - Duration::hours(1) - Duration::seconds(30);
        let strict = TokenService::new(SECRET, Duration::hours(1));
        let token = strict.issue_at("user-1", "alice", Role::User, issued_at).unwrap();
        assert_eq!(strict.validate(&token), Err(AuthError::InvalidToken));

        let lenient = TokenService::new(SECRET, Duration::hours(1)).with_leeway(120);
        assert_eq!(lenient.validate(&token).unwrap().sub, "user-1");
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let tokens = TokenService::new(SECRET, Duration::days(365 * 300_000));
        let result = tokens.issue("user-1", "alice", Role::User);
        assert!(matches!(result, Err(AuthError::InternalError(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(service().validate("not.a.jwt"), Err(AuthError::InvalidToken));
        assert_eq!(service().validate(""), Err(AuthError::InvalidToken));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", service());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("test-secret"));
    }
}
