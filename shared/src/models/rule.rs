//! Station/Breed Rule Model
//!
//! One row per (station, breed) pair. Rows are always written whole;
//! a partial change is a read-modify-write of the full row.

use super::{BreedId, StationId};
use serde::{Deserialize, Serialize};

/// Columns of the unique key used for upserts
pub const RULE_CONFLICT_KEYS: [&str; 2] = ["station_id", "breed_id"];

/// Station capability rule for a breed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationBreedRule {
    pub station_id: StationId,
    pub breed_id: BreedId,
    /// Whether the station supports the breed at all
    pub is_active: bool,
    pub remote_booking_allowed: bool,
    pub requires_staff_approval: bool,
    /// Grooming time at this station; only meaningful while active
    pub duration_modifier_minutes: i32,
}

impl StationBreedRule {
    /// Unsupported rule with every flag cleared
    pub fn inactive(station_id: StationId, breed_id: BreedId) -> Self {
        Self {
            station_id,
            breed_id,
            is_active: false,
            remote_booking_allowed: false,
            requires_staff_approval: false,
            duration_modifier_minutes: 0,
        }
    }

    /// Unique key of the row
    pub fn key(&self) -> (StationId, BreedId) {
        (self.station_id, self.breed_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_rule() {
        let rule = StationBreedRule::inactive(3, 9);
        assert_eq!(rule.key(), (3, 9));
        assert!(!rule.is_active);
        assert_eq!(rule.duration_modifier_minutes, 0);
    }

    #[test]
    fn test_rule_roundtrips_through_json_row() {
        let row = serde_json::json!({
            "station_id": 1,
            "breed_id": 2,
            "is_active": true,
            "remote_booking_allowed": false,
            "requires_staff_approval": true,
            "duration_modifier_minutes": 75
        });
        let rule: StationBreedRule = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(rule.duration_modifier_minutes, 75);
        assert_eq!(serde_json::to_value(rule).unwrap(), row);
    }
}
