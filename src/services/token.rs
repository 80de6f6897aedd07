//! JWT signing, verification, and pair lifecycle.
//!
//! Access and refresh tokens are signed with separate HS256 secrets, so a
//! refresh token can never pass verification where an access token is
//! expected (and vice versa). Every signed token is also persisted; a token
//! that verifies cryptographically but has no matching row is revoked.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::Store;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    Invalid,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for TokenError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "ACCESS",
            Self::Refresh => "REFRESH",
        }
    }
}

/// Claims carried by every token. The `jti` nonce makes two tokens signed
/// within the same second distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: i32,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A signed token together with the expiry baked into its claims.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expired_at: DateTime<Utc>,
}

pub fn sign_token(user_id: i32, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = TokenClaims {
        id: user_id,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Internal(format!("Failed to sign token: {e}")))
}

/// Decode and verify a token against `secret`. Signature mismatches and
/// expired tokens both come back as [`TokenError::Invalid`].
pub fn decode_claims(token: &str, secret: &str) -> Result<TokenClaims, TokenError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::Invalid)
}

/// Issues, verifies, rotates, and revokes persisted token pairs.
pub struct TokenService {
    store: Store,
    config: AuthConfig,
}

impl TokenService {
    #[must_use]
    pub const fn new(store: Store, config: AuthConfig) -> Self {
        Self { store, config }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.config.access_token_secret,
            TokenKind::Refresh => &self.config.refresh_token_secret,
        }
    }

    #[must_use]
    pub fn access_secret(&self) -> &str {
        &self.config.access_token_secret
    }

    #[must_use]
    pub fn refresh_secret(&self) -> &str {
        &self.config.refresh_token_secret
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.config.access_token_expiry_minutes),
            TokenKind::Refresh => Duration::days(self.config.refresh_token_expiry_days),
        }
    }

    /// Sign a token of `kind`, deriving its stored expiry by decoding the
    /// freshly signed token. The persisted expiry therefore always equals
    /// the `exp` claim a verifier will see.
    pub fn generate(&self, user_id: i32, kind: TokenKind) -> Result<IssuedToken, TokenError> {
        let secret = self.secret(kind);
        let token = sign_token(user_id, secret, self.ttl(kind))?;

        let claims = decode_claims(&token, secret)?;
        let expired_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::Internal("Token expiry out of range".to_string()))?;

        Ok(IssuedToken { token, expired_at })
    }

    /// Sign an access/refresh pair and persist both rows in one transaction.
    pub async fn issue_pair(&self, user_id: i32) -> Result<(IssuedToken, IssuedToken), TokenError> {
        let access = self.generate(user_id, TokenKind::Access)?;
        let refresh = self.generate(user_id, TokenKind::Refresh)?;

        self.store
            .insert_token_pair(
                user_id,
                &access.token,
                access.expired_at,
                &refresh.token,
                refresh.expired_at,
            )
            .await?;

        Ok((access, refresh))
    }

    /// Verify a token cryptographically and against its persisted row.
    pub async fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }

        let claims = decode_claims(token, self.secret(kind))?;

        let live = self
            .store
            .has_live_token(claims.id, kind.as_str(), token)
            .await?;

        if !live {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }

    /// Exchange a live refresh token for a fresh pair. The old refresh token
    /// is consumed atomically; replaying it (or losing a concurrent race)
    /// yields [`TokenError::Invalid`] with nothing written.
    pub async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(IssuedToken, IssuedToken), TokenError> {
        let claims = self.verify(refresh_token, TokenKind::Refresh).await?;

        let access = self.generate(claims.id, TokenKind::Access)?;
        let refresh = self.generate(claims.id, TokenKind::Refresh)?;

        let rotated = self
            .store
            .rotate_token_pair(
                claims.id,
                refresh_token,
                &access.token,
                access.expired_at,
                &refresh.token,
                refresh.expired_at,
            )
            .await?;

        if !rotated {
            return Err(TokenError::Invalid);
        }

        Ok((access, refresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_decode_roundtrip() {
        let token = sign_token(42, "test_secret", Duration::minutes(15)).unwrap();
        let claims = decode_claims(&token, "test_secret").unwrap();

        assert_eq!(claims.id, 42);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn decode_rejects_wrong_secret() {
        let token = sign_token(42, "secret_a", Duration::minutes(15)).unwrap();
        let result = decode_claims(&token, "secret_b");

        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn decode_rejects_expired_token() {
        let token = sign_token(42, "test_secret", Duration::minutes(-5)).unwrap();
        let result = decode_claims(&token, "test_secret");

        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_claims("not.a.jwt", "test_secret"),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            decode_claims("", "test_secret"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn tokens_are_unique_per_signing() {
        let a = sign_token(1, "test_secret", Duration::minutes(15)).unwrap();
        let b = sign_token(1, "test_secret", Duration::minutes(15)).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(TokenKind::Access.as_str(), "ACCESS");
        assert_eq!(TokenKind::Refresh.as_str(), "REFRESH");
    }
}
