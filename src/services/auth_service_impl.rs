//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::entities::roles;
use crate::services::auth_service::{
    AuthError, AuthService, RefreshResult, RoleInfo, SignInResult, UserProfile,
};
use crate::services::token::{TokenService, decode_claims};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, tokens: Arc<TokenService>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }
}

fn profile_from(user: User, roles: Vec<roles::Model>) -> UserProfile {
    UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        roles: roles
            .into_iter()
            .map(|r| RoleInfo {
                id: r.id,
                name: r.name,
            })
            .collect(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResult, AuthError> {
        let user = self
            .store
            .verify_user_credentials(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let (access, refresh) = self.tokens.issue_pair(user.id).await?;
        let roles = self.store.get_user_roles(user.id).await?;

        Ok(SignInResult {
            user: profile_from(user, roles),
            access_token: access,
            refresh_token: refresh,
        })
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let result = self
            .store
            .create_user_with_role(name, email, password, "USER", &self.security)
            .await;

        let user = match result {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };

        let roles = self.store.get_user_roles(user.id).await?;

        Ok(profile_from(user, roles))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError> {
        let (access, refresh) = self.tokens.refresh(refresh_token).await?;

        Ok(RefreshResult {
            access_token: access,
            refresh_token: refresh,
        })
    }

    async fn sign_out(
        &self,
        user_id: i32,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AuthError> {
        // Both tokens must verify and name the caller before any row is
        // touched; a pair presented by anyone else revokes nothing.
        let access_claims = decode_claims(access_token, self.tokens.access_secret())
            .map_err(|_| AuthError::InvalidToken)?;
        let refresh_claims = decode_claims(refresh_token, self.tokens.refresh_secret())
            .map_err(|_| AuthError::InvalidToken)?;

        if access_claims.id != user_id || refresh_claims.id != user_id {
            return Err(AuthError::InvalidToken);
        }

        let deleted = self
            .store
            .delete_token_pair(user_id, access_token, refresh_token)
            .await?;

        if !deleted {
            return Err(AuthError::InvalidToken);
        }

        Ok(())
    }

    async fn me(&self, user_id: i32) -> Result<UserProfile, AuthError> {
        let (user, roles) = self
            .store
            .get_user_with_roles(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(profile_from(user, roles))
    }
}
