use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::{api_keys, prelude::*};

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// An unknown key and an INACTIVE key are indistinguishable to callers.
    pub async fn is_active(&self, key: &str) -> Result<bool> {
        let found = ApiKeys::find()
            .filter(api_keys::Column::Key.eq(key))
            .filter(api_keys::Column::Status.eq("ACTIVE"))
            .one(&self.conn)
            .await
            .context("Failed to query API key")?;

        Ok(found.is_some())
    }
}
