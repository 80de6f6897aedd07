use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use crate::entities::{prelude::*, user_tokens};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert an access/refresh pair in one transaction: both rows or neither.
    pub async fn insert_pair(
        &self,
        user_id: i32,
        access_token: &str,
        access_expired_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expired_at: DateTime<Utc>,
    ) -> Result<()> {
        let txn = self.conn.begin().await?;

        UserTokens::insert_many([
            user_tokens::ActiveModel {
                user_id: Set(user_id),
                kind: Set("ACCESS".to_string()),
                token: Set(access_token.to_string()),
                expired_at: Set(access_expired_at),
                ..Default::default()
            },
            user_tokens::ActiveModel {
                user_id: Set(user_id),
                kind: Set("REFRESH".to_string()),
                token: Set(refresh_token.to_string()),
                expired_at: Set(refresh_expired_at),
                ..Default::default()
            },
        ])
        .exec(&txn)
        .await
        .context("Failed to insert token pair")?;

        txn.commit().await?;
        Ok(())
    }

    /// A cryptographically valid token with no matching row is revoked.
    pub async fn is_live(&self, user_id: i32, kind: &str, token: &str) -> Result<bool> {
        let found = UserTokens::find()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .filter(user_tokens::Column::Kind.eq(kind))
            .filter(user_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query token row")?;

        Ok(found.is_some())
    }

    /// Rotate a refresh token: delete the old REFRESH row and insert the new
    /// pair in one transaction. Returns false (and writes nothing) if the old
    /// row was already gone, e.g. a concurrent refresh won the race.
    pub async fn rotate_pair(
        &self,
        user_id: i32,
        old_refresh_token: &str,
        access_token: &str,
        access_expired_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expired_at: DateTime<Utc>,
    ) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let deleted = UserTokens::delete_many()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .filter(user_tokens::Column::Kind.eq("REFRESH"))
            .filter(user_tokens::Column::Token.eq(old_refresh_token))
            .exec(&txn)
            .await
            .context("Failed to delete rotated refresh token")?;

        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        UserTokens::insert_many([
            user_tokens::ActiveModel {
                user_id: Set(user_id),
                kind: Set("ACCESS".to_string()),
                token: Set(access_token.to_string()),
                expired_at: Set(access_expired_at),
                ..Default::default()
            },
            user_tokens::ActiveModel {
                user_id: Set(user_id),
                kind: Set("REFRESH".to_string()),
                token: Set(refresh_token.to_string()),
                expired_at: Set(refresh_expired_at),
                ..Default::default()
            },
        ])
        .exec(&txn)
        .await
        .context("Failed to insert rotated token pair")?;

        txn.commit().await?;
        Ok(true)
    }

    /// Delete a full pair on sign-out. All-or-nothing: if either row is
    /// missing, nothing is deleted and false is returned.
    pub async fn delete_pair(
        &self,
        user_id: i32,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let access_deleted = UserTokens::delete_many()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .filter(user_tokens::Column::Kind.eq("ACCESS"))
            .filter(user_tokens::Column::Token.eq(access_token))
            .exec(&txn)
            .await
            .context("Failed to delete access token")?;

        let refresh_deleted = UserTokens::delete_many()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .filter(user_tokens::Column::Kind.eq("REFRESH"))
            .filter(user_tokens::Column::Token.eq(refresh_token))
            .exec(&txn)
            .await
            .context("Failed to delete refresh token")?;

        if access_deleted.rows_affected == 0 || refresh_deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit().await?;
        Ok(true)
    }

    /// Delete every token row past its expiry. Idempotent; deleting an
    /// already-deleted row is a no-op.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = UserTokens::delete_many()
            .filter(user_tokens::Column::ExpiredAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to delete expired tokens")?;

        Ok(result.rows_affected)
    }
}
