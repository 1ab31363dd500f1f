#![allow(dead_code)]

use groom_admin::MatrixEditor;
use groom_client::MemoryStore;
use serde_json::{Value, json};
use shared::models::{BreedId, StationBreedRule, StationId, TagKind};
use std::sync::Arc;

pub const TUB: StationId = 1;
pub const TABLE: StationId = 2;
pub const DRYER: StationId = 3;

pub const POODLE: BreedId = 1;
pub const BEAGLE: BreedId = 2;
pub const HUSKY: BreedId = 3;

pub const RULES: &str = "station_breed_rules";

fn rule(station: StationId, breed: BreedId, active: bool, minutes: i32, remote: bool) -> Value {
    json!({
        "station_id": station,
        "breed_id": breed,
        "is_active": active,
        "remote_booking_allowed": remote,
        "requires_staff_approval": false,
        "duration_modifier_minutes": minutes,
    })
}

/// Three stations, three breeds:
///
/// | breed  | tub        | table      | dryer      |
/// |--------|------------|------------|------------|
/// | poodle | on, 30m    | -          | -          |
/// | beagle | on, 45m, R | on, 45m    | on, 60m    |
/// | husky  | off, 25m   | -          | -          |
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        "stations",
        vec![
            json!({"id": TUB, "name": "Tub", "is_active": true, "display_order": 0}),
            json!({"id": TABLE, "name": "Table", "is_active": true, "display_order": 1}),
            json!({"id": DRYER, "name": "Dryer", "is_active": true, "display_order": 2}),
        ],
    );
    store.seed(
        "breeds",
        vec![
            json!({"id": POODLE, "name": "Poodle", "size_class": "medium"}),
            json!({"id": BEAGLE, "name": "Beagle", "size_class": "small", "hourly_price": 30.0, "notes": "Gentle"}),
            json!({"id": HUSKY, "name": "Husky", "size_class": "large"}),
        ],
    );
    store.seed(
        RULES,
        vec![
            rule(TUB, POODLE, true, 30, false),
            rule(TUB, BEAGLE, true, 45, true),
            rule(TABLE, BEAGLE, true, 45, false),
            rule(DRYER, BEAGLE, true, 60, false),
            rule(TUB, HUSKY, false, 25, false),
        ],
    );
    store.seed(
        TagKind::Category.table(),
        vec![json!({"id": 1, "name": "Toy"}), json!({"id": 2, "name": "Working"})],
    );
    store.seed(TagKind::Type.table(), vec![json!({"id": 1, "name": "Long coat"})]);
    store.seed(
        TagKind::Category.link_table(),
        vec![
            json!({"breed_id": POODLE, "tag_id": 1}),
            json!({"breed_id": HUSKY, "tag_id": 2}),
        ],
    );
    store.seed(
        TagKind::Type.link_table(),
        vec![json!({"breed_id": POODLE, "tag_id": 1})],
    );
    store
}

pub async fn load(store: &MemoryStore) -> MatrixEditor {
    MatrixEditor::load(Arc::new(store.clone()))
        .await
        .expect("matrix should load")
}

/// Persisted rule for (station, breed)
pub fn stored_rule(store: &MemoryStore, station: StationId, breed: BreedId) -> Option<StationBreedRule> {
    store
        .rows(RULES)
        .into_iter()
        .filter_map(|row| serde_json::from_value::<StationBreedRule>(row).ok())
        .find(|r| r.station_id == station && r.breed_id == breed)
}

pub fn stored_rules_for_breed(store: &MemoryStore, breed: BreedId) -> Vec<StationBreedRule> {
    store
        .rows(RULES)
        .into_iter()
        .filter_map(|row| serde_json::from_value::<StationBreedRule>(row).ok())
        .filter(|r| r.breed_id == breed)
        .collect()
}

pub fn stored_links(store: &MemoryStore, kind: TagKind, breed: BreedId) -> Vec<i64> {
    let mut ids: Vec<i64> = store
        .rows(kind.link_table())
        .into_iter()
        .filter(|row| row["breed_id"] == json!(breed))
        .filter_map(|row| row["tag_id"].as_i64())
        .collect();
    ids.sort();
    ids
}
