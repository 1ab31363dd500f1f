//! Category/Type Tag Repository

use super::BaseRepository;
use groom_client::{Filter, Order, Persistence, Select, decode_row, decode_rows, encode_rows};
use shared::models::{BreedId, Tag, TagId, TagKind, TagLink};
use shared::{AppError, AppResult};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct TagRepository {
    base: BaseRepository,
}

impl TagRepository {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all tags of a kind ordered by name
    pub async fn find_all(&self, kind: TagKind) -> AppResult<Vec<Tag>> {
        let query = Select::from(kind.table()).order_by(Order::asc("name"));
        let rows = self.base.db().select(&query).await?;
        Ok(decode_rows(rows)?)
    }

    /// Create a new tag
    pub async fn create(&self, kind: TagKind, name: &str) -> AppResult<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Tag name is required").with_detail("field", "name"));
        }
        let rows = self
            .base
            .db()
            .insert(kind.table(), vec![serde_json::json!({ "name": name })])
            .await?;
        Ok(decode_row(rows)?)
    }

    /// Hard delete a tag and its links
    pub async fn delete(&self, kind: TagKind, id: TagId) -> AppResult<bool> {
        let db = self.base.db();
        db.delete(kind.link_table(), &[Filter::eq("tag_id", id)]).await?;
        let removed = db.delete(kind.table(), &[Filter::eq("id", id)]).await?;
        Ok(removed > 0)
    }

    /// Every link row of a kind
    pub async fn links(&self, kind: TagKind) -> AppResult<Vec<TagLink>> {
        let rows = self.base.db().select(&Select::from(kind.link_table())).await?;
        Ok(decode_rows(rows)?)
    }

    /// Replace a breed's links: delete all, then insert the selection
    pub async fn replace_links(
        &self,
        kind: TagKind,
        breed_id: BreedId,
        tag_ids: &BTreeSet<TagId>,
    ) -> AppResult<()> {
        let db = self.base.db();
        let table = kind.link_table();
        db.delete(table, &[Filter::eq("breed_id", breed_id)]).await?;

        if !tag_ids.is_empty() {
            let links: Vec<TagLink> = tag_ids
                .iter()
                .map(|tag_id| TagLink {
                    breed_id,
                    tag_id: *tag_id,
                })
                .collect();
            db.insert(table, encode_rows(&links)?).await?;
        }
        tracing::debug!(breed_id, table, tags = tag_ids.len(), "Tag links replaced");
        Ok(())
    }
}
