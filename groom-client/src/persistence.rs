//! Persistence trait shared by the REST and in-memory backends
//!
//! Rows travel as JSON objects; callers convert to and from the typed
//! models in `shared` with [`decode_rows`] and [`encode_rows`].

use crate::query::{Filter, Select};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Table and remote-function access
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Read rows matching the query
    async fn select(&self, query: &Select) -> ClientResult<Vec<Value>>;

    /// Insert rows, returning them with server-assigned columns
    async fn insert(&self, table: &str, rows: Vec<Value>) -> ClientResult<Vec<Value>>;

    /// Patch every row matching the filters, returning the updated rows
    async fn update(&self, table: &str, filters: &[Filter], patch: Value)
    -> ClientResult<Vec<Value>>;

    /// Insert or replace rows keyed on `conflict_keys`
    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_keys: &[&str],
    ) -> ClientResult<Vec<Value>>;

    /// Delete every row matching the filters, returning the number removed
    async fn delete(&self, table: &str, filters: &[Filter]) -> ClientResult<u64>;

    /// Call a remote function
    async fn invoke(&self, function: &str, payload: Value) -> ClientResult<Value>;
}

/// Deserialize a list of rows
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> ClientResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClientError::from))
        .collect()
}

/// Deserialize the first row, failing when the backend returned none
pub fn decode_row<T: DeserializeOwned>(rows: Vec<Value>) -> ClientResult<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::InvalidResponse("Expected at least one row".to_string()))?;
    Ok(serde_json::from_value(row)?)
}

/// Serialize models into rows
pub fn encode_rows<T: Serialize>(items: &[T]) -> ClientResult<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(ClientError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::models::{StationBreedRule, TagLink};

    #[test]
    fn test_decode_rows_ignores_extra_columns() {
        let rows = vec![json!({"id": 9, "breed_id": 1, "tag_id": 4})];
        let links: Vec<TagLink> = decode_rows(rows).unwrap();
        assert_eq!(links, vec![TagLink { breed_id: 1, tag_id: 4 }]);
    }

    #[test]
    fn test_decode_row_requires_a_row() {
        let err = decode_row::<TagLink>(Vec::new()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn test_encode_rows() {
        let rows = encode_rows(&[StationBreedRule::inactive(1, 2)]).unwrap();
        assert_eq!(rows[0]["station_id"], 1);
        assert_eq!(rows[0]["is_active"], false);
    }
}
