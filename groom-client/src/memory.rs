// groom-client/src/memory.rs
// In-process backend: tables held in memory, used by tests and offline tooling

use crate::persistence::Persistence;
use crate::query::{Filter, Select};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Handler backing a remote function
pub type FunctionHandler = Arc<dyn Fn(Value) -> ClientResult<Value> + Send + Sync>;

/// Persistence operation kind, used for call counters and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
    Invoke,
}

type Row = Map<String, Value>;

struct Injected {
    op: Operation,
    /// Table or function name; `None` matches any
    target: Option<String>,
    message: String,
}

struct Hold {
    op: Operation,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Row>>,
    next_ids: HashMap<String, i64>,
    functions: HashMap<String, FunctionHandler>,
    failures: Vec<Injected>,
    holds: Vec<Hold>,
    calls: HashMap<Operation, usize>,
}

impl MemoryState {
    fn next_id(&mut self, table: &str) -> i64 {
        let max_existing = self
            .tables
            .get(table)
            .into_iter()
            .flatten()
            .filter_map(|row| row.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        let counter = self.next_ids.entry(table.to_string()).or_insert(0);
        *counter = (*counter).max(max_existing) + 1;
        *counter
    }

    /// Record the call, then hand back a pending hold and any injected failure
    fn begin(
        &mut self,
        op: Operation,
        target: &str,
    ) -> (Option<oneshot::Receiver<()>>, Option<ClientError>) {
        *self.calls.entry(op).or_insert(0) += 1;

        let hold = self
            .holds
            .iter()
            .position(|h| h.op == op)
            .map(|i| self.holds.remove(i).release);

        let failure = self
            .failures
            .iter()
            .position(|f| f.op == op && f.target.as_deref().is_none_or(|t| t == target))
            .map(|i| self.failures.remove(i))
            .map(|f| match op {
                Operation::Invoke => ClientError::Function {
                    function: target.to_string(),
                    message: f.message,
                },
                _ => ClientError::Api {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: f.message,
                },
            });

        (hold, failure)
    }
}

/// In-memory tables with auto ids, conflict-key upserts and remote
/// function handlers
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryStore")
            .field("tables", &state.tables.keys().collect::<Vec<_>>())
            .field("functions", &state.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows directly, bypassing counters and fault injection
    pub fn seed(&self, table: &str, rows: Vec<Value>) -> Vec<Value> {
        let mut state = self.state.lock();
        insert_rows(&mut state, table, rows)
    }

    /// Snapshot of a table's rows in insertion order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Register the handler answering `invoke(name, ..)`
    pub fn register_function<F>(&self, name: &str, handler: F)
    where
        F: Fn(Value) -> ClientResult<Value> + Send + Sync + 'static,
    {
        self.state
            .lock()
            .functions
            .insert(name.to_string(), Arc::new(handler));
    }

    /// Make the next matching call fail once
    pub fn inject_failure(&self, op: Operation, target: Option<&str>) {
        self.state.lock().failures.push(Injected {
            op,
            target: target.map(str::to_string),
            message: "injected failure".to_string(),
        });
    }

    /// Park the next call of `op` until the returned sender fires (or drops)
    pub fn hold_next(&self, op: Operation) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().holds.push(Hold { op, release: rx });
        tx
    }

    /// Number of calls made through the trait for `op`
    pub fn call_count(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn reset_counts(&self) {
        self.state.lock().calls.clear();
    }

    async fn enter(&self, op: Operation, target: &str) -> ClientResult<()> {
        let (hold, failure) = self.state.lock().begin(op, target);
        if let Some(release) = hold {
            // A dropped sender releases the call too
            let _ = release.await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn as_row(value: Value) -> ClientResult<Row> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(ClientError::Validation(format!(
            "Row must be an object, got {}",
            other
        ))),
    }
}

fn insert_rows(state: &mut MemoryState, table: &str, rows: Vec<Value>) -> Vec<Value> {
    let mut inserted = Vec::with_capacity(rows.len());
    for value in rows {
        let Value::Object(mut row) = value else {
            continue;
        };
        if !row.contains_key("id") {
            let id = state.next_id(table);
            row.insert("id".to_string(), Value::from(id));
        }
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        inserted.push(Value::Object(row));
    }
    inserted
}

fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn select(&self, query: &Select) -> ClientResult<Vec<Value>> {
        self.enter(Operation::Select, &query.table).await?;
        let state = self.state.lock();
        let mut rows: Vec<&Row> = state
            .tables
            .get(&query.table)
            .into_iter()
            .flatten()
            .filter(|row| matches_all(&query.filters, row))
            .collect();
        rows.sort_by(|a, b| query.compare_rows(a, b));

        Ok(rows
            .into_iter()
            .map(|row| {
                if query.columns.is_empty() {
                    Value::Object(row.clone())
                } else {
                    let projected: Row = query
                        .columns
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                        .collect();
                    Value::Object(projected)
                }
            })
            .collect())
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> ClientResult<Vec<Value>> {
        self.enter(Operation::Insert, table).await?;
        if let Some(bad) = rows.iter().find(|r| !r.is_object()) {
            return Err(ClientError::Validation(format!(
                "Row must be an object, got {}",
                bad
            )));
        }
        let mut state = self.state.lock();
        Ok(insert_rows(&mut state, table, rows))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> ClientResult<Vec<Value>> {
        self.enter(Operation::Update, table).await?;
        let patch = as_row(patch)?;
        let mut state = self.state.lock();
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches_all(filters, row)) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        conflict_keys: &[&str],
    ) -> ClientResult<Vec<Value>> {
        self.enter(Operation::Upsert, table).await?;
        let incoming = rows.into_iter().map(as_row).collect::<ClientResult<Vec<_>>>()?;
        let keys: Vec<&str> = if conflict_keys.is_empty() {
            vec!["id"]
        } else {
            conflict_keys.to_vec()
        };

        let mut state = self.state.lock();
        let mut affected = Vec::with_capacity(incoming.len());
        let mut fresh = Vec::new();
        {
            let existing = state.tables.entry(table.to_string()).or_default();
            for row in incoming {
                let same_key = |other: &Row| {
                    keys.iter()
                        .all(|k| row.get(*k).is_some() && row.get(*k) == other.get(*k))
                };
                match existing.iter_mut().find(|other| same_key(other)) {
                    Some(current) => {
                        for (key, value) in &row {
                            current.insert(key.clone(), value.clone());
                        }
                        affected.push(Value::Object(current.clone()));
                    }
                    None => fresh.push(Value::Object(row)),
                }
            }
        }
        affected.extend(insert_rows(&mut state, table, fresh));
        Ok(affected)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> ClientResult<u64> {
        self.enter(Operation::Delete, table).await?;
        let mut state = self.state.lock();
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches_all(filters, row));
        Ok((before - rows.len()) as u64)
    }

    async fn invoke(&self, function: &str, payload: Value) -> ClientResult<Value> {
        self.enter(Operation::Invoke, function).await?;
        let handler = self.state.lock().functions.get(function).cloned();
        match handler {
            Some(handler) => handler(payload),
            None => Err(ClientError::Function {
                function: function.to_string(),
                message: "function not registered".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Order;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = MemoryStore::new();
        store.seed("breeds", vec![json!({"id": 10, "name": "Pug"})]);

        let rows = store
            .insert("breeds", vec![json!({"name": "Beagle"}), json!({"name": "Akita"})])
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], 11);
        assert_eq!(rows[1]["id"], 12);
        assert_eq!(store.rows("breeds").len(), 3);
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let store = MemoryStore::new();
        store.seed(
            "stations",
            vec![
                json!({"name": "Tub", "display_order": 2, "is_active": true}),
                json!({"name": "Table", "display_order": 1, "is_active": true}),
                json!({"name": "Dryer", "display_order": 3, "is_active": false}),
            ],
        );

        let query = Select::from("stations")
            .columns(["name"])
            .eq("is_active", true)
            .order_by(Order::asc("display_order"));
        let rows = store.select(&query).await.unwrap();
        assert_eq!(rows, vec![json!({"name": "Table"}), json!({"name": "Tub"})]);
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict_keys() {
        let store = MemoryStore::new();
        let keys = ["station_id", "breed_id"];
        store
            .upsert(
                "station_breed_rules",
                vec![json!({"station_id": 1, "breed_id": 2, "is_active": true})],
                &keys,
            )
            .await
            .unwrap();
        let affected = store
            .upsert(
                "station_breed_rules",
                vec![
                    json!({"station_id": 1, "breed_id": 2, "is_active": false}),
                    json!({"station_id": 2, "breed_id": 2, "is_active": true}),
                ],
                &keys,
            )
            .await
            .unwrap();

        assert_eq!(affected.len(), 2);
        let rows = store.rows("station_breed_rules");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["is_active"], false);
        assert_eq!(store.call_count(Operation::Upsert), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        store.seed(
            "breed_type_links",
            vec![
                json!({"breed_id": 1, "tag_id": 1}),
                json!({"breed_id": 1, "tag_id": 2}),
                json!({"breed_id": 2, "tag_id": 1}),
            ],
        );

        let updated = store
            .update(
                "breed_type_links",
                &[Filter::eq("breed_id", 2)],
                json!({"tag_id": 3}),
            )
            .await
            .unwrap();
        assert_eq!(updated[0]["tag_id"], 3);

        let removed = store
            .delete("breed_type_links", &[Filter::eq("breed_id", 1)])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.rows("breed_type_links").len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = MemoryStore::new();
        store.inject_failure(Operation::Insert, Some("stations"));

        // Other tables are unaffected
        assert!(store.insert("breeds", vec![json!({"name": "Pug"})]).await.is_ok());

        let err = store
            .insert("stations", vec![json!({"name": "Tub"})])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { .. }));
        assert!(store.rows("stations").is_empty());

        assert!(store.insert("stations", vec![json!({"name": "Tub"})]).await.is_ok());
    }

    #[tokio::test]
    async fn test_invoke() {
        let store = MemoryStore::new();
        store.register_function("echo", |payload| Ok(json!({"echo": payload})));

        let result = store.invoke("echo", json!(1)).await.unwrap();
        assert_eq!(result, json!({"echo": 1}));

        let err = store.invoke("missing", Value::Null).await.unwrap_err();
        assert!(matches!(err, ClientError::Function { .. }));

        store.inject_failure(Operation::Invoke, None);
        assert!(store.invoke("echo", json!(2)).await.is_err());
        assert_eq!(store.call_count(Operation::Invoke), 3);
    }

    #[tokio::test]
    async fn test_hold_next_parks_call() {
        let store = MemoryStore::new();
        let release = store.hold_next(Operation::Insert);

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.insert("breeds", vec![json!({"name": "Pug"})]).await })
        };
        while store.call_count(Operation::Insert) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(store.rows("breeds").is_empty());

        release.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(store.rows("breeds").len(), 1);
    }
}
