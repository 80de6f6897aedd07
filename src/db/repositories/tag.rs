use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::{prelude::*, tags};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Paged listing with optional name/slug substring search.
    /// `page` is 1-based; returns the page rows plus the total item count.
    pub async fn list(
        &self,
        page: u64,
        size: u64,
        order_by: tags::Column,
        descending: bool,
        search: Option<&str>,
    ) -> Result<(Vec<tags::Model>, u64)> {
        let mut query = Tags::find();

        if let Some(term) = search {
            query = query.filter(
                Condition::any()
                    .add(tags::Column::Name.contains(term))
                    .add(tags::Column::Slug.contains(term)),
            );
        }

        query = if descending {
            query.order_by_desc(order_by)
        } else {
            query.order_by_asc(order_by)
        };

        let paginator = query.paginate(&self.conn, size);
        let total_items = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((items, total_items))
    }

    pub async fn get(&self, id: i32) -> Result<Option<tags::Model>> {
        let tag = Tags::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query tag by ID")?;

        Ok(tag)
    }

    /// Create tags sequentially in one transaction so slug counting sees
    /// earlier inserts of the same batch. A taken slug gets a numeric
    /// suffix from the count of rows already using it.
    pub async fn create_many(
        &self,
        items: Vec<(String, String)>,
        created_by: i32,
    ) -> Result<Vec<tags::Model>> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let mut created = Vec::with_capacity(items.len());

        for (name, base_slug) in items {
            let taken = Tags::find()
                .filter(tags::Column::Slug.eq(base_slug.as_str()))
                .count(&txn)
                .await?;

            let slug = if taken == 0 {
                base_slug
            } else {
                format!("{base_slug}-{taken}")
            };

            let tag = tags::ActiveModel {
                name: Set(name),
                slug: Set(slug),
                meals_count: Set(0),
                drinks_count: Set(0),
                created_by: Set(Some(created_by)),
                updated_by: Set(Some(created_by)),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            created.push(tag);
        }

        txn.commit().await?;
        Ok(created)
    }

    /// Rename a tag, re-deriving its slug with the same suffix rule
    /// (the tag's own current slug does not count against it).
    pub async fn update(
        &self,
        id: i32,
        name: &str,
        base_slug: &str,
        updated_by: i32,
    ) -> Result<Option<tags::Model>> {
        let Some(tag) = Tags::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let taken = Tags::find()
            .filter(tags::Column::Slug.eq(base_slug))
            .filter(tags::Column::Id.ne(id))
            .count(&self.conn)
            .await?;

        let slug = if taken == 0 {
            base_slug.to_string()
        } else {
            format!("{base_slug}-{taken}")
        };

        let mut active: tags::ActiveModel = tag.into();
        active.name = Set(name.to_string());
        active.slug = Set(slug);
        active.updated_by = Set(Some(updated_by));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update tag")?;

        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Tags::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete tag")?;

        Ok(result.rows_affected > 0)
    }

    /// Delete every tag whose id appears in `ids`; unknown ids are skipped.
    pub async fn delete_many(&self, ids: &[i32]) -> Result<u64> {
        let result = Tags::delete_many()
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.conn)
            .await
            .context("Failed to delete tags")?;

        Ok(result.rows_affected)
    }
}
