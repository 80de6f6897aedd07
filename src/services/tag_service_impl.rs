//! `SeaORM` implementation of the `TagService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::entities::tags;
use crate::services::tag_service::{TagDto, TagError, TagListParams, TagPage, TagService};

pub struct SeaOrmTagService {
    store: Store,
}

impl SeaOrmTagService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Lowercase the name and collapse whitespace runs into single hyphens.
/// "Spicy Food" and "spicy   food" both slugify to "spicy-food".
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn order_column(order_by: &str) -> Option<tags::Column> {
    match order_by {
        "name" => Some(tags::Column::Name),
        "slug" => Some(tags::Column::Slug),
        "meals_count" => Some(tags::Column::MealsCount),
        "drinks_count" => Some(tags::Column::DrinksCount),
        "created_at" => Some(tags::Column::CreatedAt),
        "updated_at" => Some(tags::Column::UpdatedAt),
        _ => None,
    }
}

#[async_trait]
impl TagService for SeaOrmTagService {
    async fn list(&self, params: TagListParams) -> Result<TagPage, TagError> {
        let order_by = order_column(&params.order_by).ok_or_else(|| {
            TagError::Validation(format!("Unknown sort column: {}", params.order_by))
        })?;

        let (items, total_items) = self
            .store
            .list_tags(
                params.page,
                params.size,
                order_by,
                params.descending,
                params.search.as_deref(),
            )
            .await?;

        Ok(TagPage {
            items: items.into_iter().map(TagDto::from).collect(),
            total_items,
        })
    }

    async fn get(&self, id: i32) -> Result<TagDto, TagError> {
        let tag = self.store.get_tag(id).await?.ok_or(TagError::NotFound)?;

        Ok(TagDto::from(tag))
    }

    async fn create(&self, names: Vec<String>, created_by: i32) -> Result<Vec<TagDto>, TagError> {
        let items = names
            .into_iter()
            .map(|name| {
                let slug = slugify(&name);
                (name, slug)
            })
            .collect();

        let created = self.store.create_tags(items, created_by).await?;

        Ok(created.into_iter().map(TagDto::from).collect())
    }

    async fn update(&self, id: i32, name: &str, updated_by: i32) -> Result<TagDto, TagError> {
        let updated = self
            .store
            .update_tag(id, name, &slugify(name), updated_by)
            .await?
            .ok_or(TagError::NotFound)?;

        Ok(TagDto::from(updated))
    }

    async fn delete(&self, id: i32) -> Result<(), TagError> {
        let deleted = self.store.delete_tag(id).await?;

        if !deleted {
            return Err(TagError::NotFound);
        }

        Ok(())
    }

    async fn delete_batch(&self, ids: &[i32]) -> Result<u64, TagError> {
        let deleted = self.store.delete_tags(ids).await?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Spicy Food"), "spicy-food");
        assert_eq!(slugify("spicy   food"), "spicy-food");
        assert_eq!(slugify("  Vegan  "), "vegan");
        assert_eq!(slugify("one"), "one");
    }

    #[test]
    fn slugify_handles_tabs_and_newlines() {
        assert_eq!(slugify("a\tb\nc"), "a-b-c");
    }

    #[test]
    fn order_column_whitelist() {
        assert!(order_column("name").is_some());
        assert!(order_column("updated_at").is_some());
        assert!(order_column("meals_count").is_some());
        assert!(order_column("id").is_none());
        assert!(order_column("password_hash").is_none());
    }
}
