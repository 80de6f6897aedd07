//! Domain service for authentication and account access.
//!
//! Handles sign-up, sign-in, token refresh, sign-out, and profile lookup.

use serde::Serialize;
use thiserror::Error;

use crate::services::token::{IssuedToken, TokenError};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::InvalidToken,
            TokenError::Database(msg) => Self::Database(msg),
            TokenError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleInfo {
    pub id: i32,
    pub name: String,
}

/// User profile DTO for responses. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleInfo>,
    pub created_at: String,
    pub updated_at: String,
}

/// Sign-in result: profile plus a freshly persisted token pair.
#[derive(Debug, Clone, Serialize)]
pub struct SignInResult {
    pub user: UserProfile,
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, persists a new token pair, and returns both.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password; the two cases are indistinguishable to the caller.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, AuthError>;

    /// Registers a new account with the USER role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] when the email is already registered.
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError>;

    /// Exchanges a live refresh token for a fresh pair, consuming the old one.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError>;

    /// Revokes a full token pair. Both tokens must be cryptographically valid,
    /// belong to `user_id`, and still be live; otherwise nothing is revoked.
    async fn sign_out(
        &self,
        user_id: i32,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AuthError>;

    /// Gets the profile (with roles) for an authenticated user.
    async fn me(&self, user_id: i32) -> Result<UserProfile, AuthError>;
}
