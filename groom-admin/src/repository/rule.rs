//! Station/Breed Rule Repository

use super::{BaseRepository, tables};
use groom_client::{Filter, Order, Persistence, Select, decode_rows, encode_rows};
use shared::AppResult;
use shared::models::{BreedId, RULE_CONFLICT_KEYS, StationBreedRule, StationId};
use std::sync::Arc;

const TABLE: &str = tables::RULES;

#[derive(Clone)]
pub struct RuleRepository {
    base: BaseRepository,
}

impl RuleRepository {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn find(&self, query: Select) -> AppResult<Vec<StationBreedRule>> {
        let query = query
            .order_by(Order::asc("breed_id"))
            .order_by(Order::asc("station_id"));
        let rows = self.base.db().select(&query).await?;
        Ok(decode_rows(rows)?)
    }

    pub async fn find_all(&self) -> AppResult<Vec<StationBreedRule>> {
        self.find(Select::from(TABLE)).await
    }

    pub async fn find_by_breed(&self, breed_id: BreedId) -> AppResult<Vec<StationBreedRule>> {
        self.find(Select::from(TABLE).eq("breed_id", breed_id)).await
    }

    pub async fn find_by_station(&self, station_id: StationId) -> AppResult<Vec<StationBreedRule>> {
        self.find(Select::from(TABLE).eq("station_id", station_id)).await
    }

    /// Insert or replace whole rule rows in one batch
    pub async fn upsert(&self, rules: &[StationBreedRule]) -> AppResult<Vec<StationBreedRule>> {
        if rules.is_empty() {
            return Ok(Vec::new());
        }
        let rows = encode_rows(rules)?;
        let written = self
            .base
            .db()
            .upsert(TABLE, rows, &RULE_CONFLICT_KEYS)
            .await?;
        tracing::debug!(rules = rules.len(), "Rules upserted");
        Ok(decode_rows(written)?)
    }

    pub async fn delete_for_breed(&self, breed_id: BreedId) -> AppResult<u64> {
        Ok(self
            .base
            .db()
            .delete(TABLE, &[Filter::eq("breed_id", breed_id)])
            .await?)
    }
}
