use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{roles, tags};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn api_key_repo(&self) -> repositories::api_key::ApiKeyRepository {
        repositories::api_key::ApiKeyRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    // ========== Users & roles ==========

    pub async fn get_user_with_roles(&self, id: i32) -> Result<Option<(User, Vec<roles::Model>)>> {
        self.user_repo().get_with_roles(id).await
    }

    pub async fn get_user_role_names(&self, user_id: i32) -> Result<Vec<String>> {
        self.user_repo().get_role_names(user_id).await
    }

    pub async fn get_user_roles(&self, user_id: i32) -> Result<Vec<roles::Model>> {
        self.user_repo().get_roles(user_id).await
    }

    pub async fn verify_user_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn create_user_with_role(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role_name: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create_with_role(name, email, password, role_name, config)
            .await
    }

    // ========== Tokens ==========

    pub async fn insert_token_pair(
        &self,
        user_id: i32,
        access_token: &str,
        access_expired_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expired_at: DateTime<Utc>,
    ) -> Result<()> {
        self.token_repo()
            .insert_pair(
                user_id,
                access_token,
                access_expired_at,
                refresh_token,
                refresh_expired_at,
            )
            .await
    }

    pub async fn has_live_token(&self, user_id: i32, kind: &str, token: &str) -> Result<bool> {
        self.token_repo().is_live(user_id, kind, token).await
    }

    pub async fn rotate_token_pair(
        &self,
        user_id: i32,
        old_refresh_token: &str,
        access_token: &str,
        access_expired_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expired_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.token_repo()
            .rotate_pair(
                user_id,
                old_refresh_token,
                access_token,
                access_expired_at,
                refresh_token,
                refresh_expired_at,
            )
            .await
    }

    pub async fn delete_token_pair(
        &self,
        user_id: i32,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<bool> {
        self.token_repo()
            .delete_pair(user_id, access_token, refresh_token)
            .await
    }

    pub async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        self.token_repo().delete_expired(now).await
    }

    // ========== API keys ==========

    pub async fn is_api_key_active(&self, key: &str) -> Result<bool> {
        self.api_key_repo().is_active(key).await
    }

    // ========== Tags ==========

    pub async fn list_tags(
        &self,
        page: u64,
        size: u64,
        order_by: tags::Column,
        descending: bool,
        search: Option<&str>,
    ) -> Result<(Vec<tags::Model>, u64)> {
        self.tag_repo()
            .list(page, size, order_by, descending, search)
            .await
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<tags::Model>> {
        self.tag_repo().get(id).await
    }

    pub async fn create_tags(
        &self,
        items: Vec<(String, String)>,
        created_by: i32,
    ) -> Result<Vec<tags::Model>> {
        self.tag_repo().create_many(items, created_by).await
    }

    pub async fn update_tag(
        &self,
        id: i32,
        name: &str,
        base_slug: &str,
        updated_by: i32,
    ) -> Result<Option<tags::Model>> {
        self.tag_repo().update(id, name, base_slug, updated_by).await
    }

    pub async fn delete_tag(&self, id: i32) -> Result<bool> {
        self.tag_repo().delete(id).await
    }

    pub async fn delete_tags(&self, ids: &[i32]) -> Result<u64> {
        self.tag_repo().delete_many(ids).await
    }
}
