use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, roles, user_roles, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user with the roles assigned to it, or None if the user is gone.
    pub async fn get_with_roles(&self, id: i32) -> Result<Option<(User, Vec<roles::Model>)>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let roles = self.get_roles(user.id).await?;

        Ok(Some((User::from(user), roles)))
    }

    pub async fn get_roles(&self, user_id: i32) -> Result<Vec<roles::Model>> {
        let links = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .find_also_related(Roles)
            .all(&self.conn)
            .await
            .context("Failed to query user roles")?;

        Ok(links.into_iter().filter_map(|(_, role)| role).collect())
    }

    pub async fn get_role_names(&self, user_id: i32) -> Result<Vec<String>> {
        let roles = self.get_roles(user_id).await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    /// Verify credentials and return the user on success, None otherwise.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        if is_valid {
            Ok(Some(User::from(user)))
        } else {
            Ok(None)
        }
    }

    /// Create a user and link it to the named role in one transaction.
    /// The role is upserted idempotently.
    pub async fn create_with_role(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role_name: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let txn = self.conn.begin().await?;

        let role = match Roles::find()
            .filter(roles::Column::Name.eq(role_name))
            .one(&txn)
            .await?
        {
            Some(role) => role,
            None => {
                roles::ActiveModel {
                    name: Set(role_name.to_string()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        let user = users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        UserRoles::insert(user_roles::ActiveModel {
            user_id: Set(user.id),
            role_id: Set(role.id),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        txn.commit().await?;

        Ok(User::from(user))
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
