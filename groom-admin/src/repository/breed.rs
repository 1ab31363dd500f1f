//! Breed Repository

use super::{BaseRepository, tables};
use groom_client::{Filter, Order, Persistence, Select, decode_row, decode_rows};
use shared::models::{Breed, BreedCreate, BreedId, BreedUpdate, TagKind};
use shared::{AppError, AppResult};
use std::sync::Arc;

const TABLE: &str = tables::BREEDS;

#[derive(Clone)]
pub struct BreedRepository {
    base: BaseRepository,
}

impl BreedRepository {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all breeds ordered by name
    pub async fn find_all(&self) -> AppResult<Vec<Breed>> {
        let query = Select::from(TABLE).order_by(Order::asc("name"));
        let rows = self.base.db().select(&query).await?;
        Ok(decode_rows(rows)?)
    }

    /// Find breed by id
    pub async fn find_by_id(&self, id: BreedId) -> AppResult<Option<Breed>> {
        let rows = self.base.db().select(&Select::from(TABLE).eq("id", id)).await?;
        Ok(decode_rows::<Breed>(rows)?.into_iter().next())
    }

    /// Create a new breed
    pub async fn create(&self, data: BreedCreate) -> AppResult<Breed> {
        data.check()?;
        let row = serde_json::to_value(&data)
            .map_err(|e| AppError::internal(format!("Failed to encode breed: {}", e)))?;
        let rows = self.base.db().insert(TABLE, vec![row]).await?;
        let breed: Breed = decode_row(rows)?;
        tracing::info!(breed_id = breed.id, name = %breed.name, "Breed created");
        Ok(breed)
    }

    /// Update a breed, validating the merged result before sending
    pub async fn update(&self, id: BreedId, data: BreedUpdate) -> AppResult<Breed> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::breed_not_found(id))?;
        if data.is_empty() {
            return Ok(existing);
        }

        let mut merged = existing;
        merged.apply(data.clone());
        merged.validate_fields()?;

        let patch = serde_json::to_value(&data)
            .map_err(|e| AppError::internal(format!("Failed to encode breed update: {}", e)))?;
        let rows = self
            .base
            .db()
            .update(TABLE, &[Filter::eq("id", id)], patch)
            .await?;
        let breed = decode_rows::<Breed>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::breed_not_found(id))?;
        tracing::info!(breed_id = id, "Breed updated");
        Ok(breed)
    }

    /// Delete a breed along with its rules and tag links
    pub async fn delete(&self, id: BreedId) -> AppResult<bool> {
        let db = self.base.db();
        let by_breed = [Filter::eq("breed_id", id)];
        db.delete(tables::RULES, &by_breed).await?;
        for kind in TagKind::ALL {
            db.delete(kind.link_table(), &by_breed).await?;
        }
        let removed = db.delete(TABLE, &[Filter::eq("id", id)]).await?;
        tracing::info!(breed_id = id, removed, "Breed deleted");
        Ok(removed > 0)
    }
}
