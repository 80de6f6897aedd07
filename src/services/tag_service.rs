//! Domain service for tag management.

use serde::Serialize;
use thiserror::Error;

use crate::entities::tags;

/// Errors specific to tag operations.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Tag not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for TagError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TagError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Tag DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct TagDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub meals_count: i32,
    pub drinks_count: i32,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<tags::Model> for TagDto {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            meals_count: model.meals_count,
            drinks_count: model.drinks_count,
            created_by: model.created_by,
            updated_by: model.updated_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Validated listing parameters. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct TagListParams {
    pub page: u64,
    pub size: u64,
    pub order_by: String,
    pub descending: bool,
    pub search: Option<String>,
}

impl Default for TagListParams {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            order_by: "updated_at".to_string(),
            descending: true,
            search: None,
        }
    }
}

/// One page of tags plus the total match count before paging.
#[derive(Debug, Clone)]
pub struct TagPage {
    pub items: Vec<TagDto>,
    pub total_items: u64,
}

/// Domain service trait for tags.
#[async_trait::async_trait]
pub trait TagService: Send + Sync {
    /// Lists tags with pagination, sorting, and optional name/slug search.
    async fn list(&self, params: TagListParams) -> Result<TagPage, TagError>;

    /// Gets a single tag.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::NotFound`] for an unknown id.
    async fn get(&self, id: i32) -> Result<TagDto, TagError>;

    /// Creates one or more tags, deduplicating slugs within the batch.
    async fn create(&self, names: Vec<String>, created_by: i32) -> Result<Vec<TagDto>, TagError>;

    /// Renames a tag and re-derives its slug.
    async fn update(&self, id: i32, name: &str, updated_by: i32) -> Result<TagDto, TagError>;

    /// Deletes a single tag.
    async fn delete(&self, id: i32) -> Result<(), TagError>;

    /// Deletes a batch of tags, skipping unknown ids. Returns the number
    /// actually deleted.
    async fn delete_batch(&self, ids: &[i32]) -> Result<u64, TagError>;
}
