//! Station Repository

use super::{BaseRepository, tables};
use groom_client::{Filter, Order, Persistence, Select, decode_row, decode_rows};
use shared::models::{Station, StationCreate, StationId, StationUpdate};
use shared::{AppError, AppResult};
use std::sync::Arc;

const TABLE: &str = tables::STATIONS;

#[derive(Clone)]
pub struct StationRepository {
    base: BaseRepository,
}

impl StationRepository {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all stations ordered by display_order
    pub async fn find_all(&self) -> AppResult<Vec<Station>> {
        let query = Select::from(TABLE)
            .order_by(Order::asc("display_order"))
            .order_by(Order::asc("id"));
        let rows = self.base.db().select(&query).await?;
        Ok(decode_rows(rows)?)
    }

    /// Find station by id
    pub async fn find_by_id(&self, id: StationId) -> AppResult<Option<Station>> {
        let rows = self.base.db().select(&Select::from(TABLE).eq("id", id)).await?;
        Ok(decode_rows::<Station>(rows)?.into_iter().next())
    }

    /// Create a new station, appended after the last one when no order is given
    pub async fn create(&self, mut data: StationCreate) -> AppResult<Station> {
        data.check()?;
        if data.display_order.is_none() {
            let last = self
                .base
                .db()
                .select(
                    &Select::from(TABLE)
                        .columns(["display_order"])
                        .order_by(Order::desc("display_order")),
                )
                .await?;
            let max = last
                .first()
                .and_then(|row| row.get("display_order"))
                .and_then(|v| v.as_i64())
                .unwrap_or(-1);
            data.display_order = Some(i32::try_from(max + 1).unwrap_or(i32::MAX));
        }

        let row = serde_json::to_value(&data)
            .map_err(|e| AppError::internal(format!("Failed to encode station: {}", e)))?;
        let rows = self.base.db().insert(TABLE, vec![row]).await?;
        let station: Station = decode_row(rows)?;
        tracing::info!(station_id = station.id, name = %station.name, "Station created");
        Ok(station)
    }

    /// Update a station
    pub async fn update(&self, id: StationId, data: StationUpdate) -> AppResult<Station> {
        data.check()?;
        let patch = serde_json::to_value(&data)
            .map_err(|e| AppError::internal(format!("Failed to encode station update: {}", e)))?;
        let rows = self
            .base
            .db()
            .update(TABLE, &[Filter::eq("id", id)], patch)
            .await?;
        let station = decode_rows::<Station>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::station_not_found(id))?;
        tracing::info!(station_id = id, "Station updated");
        Ok(station)
    }

    /// Delete a station along with its rules
    pub async fn delete(&self, id: StationId) -> AppResult<bool> {
        let db = self.base.db();
        db.delete(tables::RULES, &[Filter::eq("station_id", id)]).await?;
        let removed = db.delete(TABLE, &[Filter::eq("id", id)]).await?;
        tracing::info!(station_id = id, removed, "Station deleted");
        Ok(removed > 0)
    }
}
