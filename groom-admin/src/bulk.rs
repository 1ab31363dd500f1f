//! Bulk transforms over a set of cells

use crate::matrix::MatrixStore;
use serde::{Deserialize, Serialize};
use shared::models::{BreedId, StationId};

/// Transformation applied to every selected cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BulkTransform {
    SetSupported(bool),
    /// Supported cells only
    SetTime(u32),
    /// Supported cells only
    SetRemoteAllowed(bool),
    /// Supported cells only
    SetApprovalNeeded(bool),
}

impl BulkTransform {
    /// Apply to one cell, returning whether the cell was touched
    pub fn apply(&self, store: &mut MatrixStore, row: BreedId, col: StationId) -> bool {
        match *self {
            BulkTransform::SetSupported(value) => {
                store.set_supported(row, col, value);
                true
            }
            BulkTransform::SetTime(minutes) => {
                store.get(row, col).supported && store.set_time(row, col, i64::from(minutes))
            }
            BulkTransform::SetRemoteAllowed(value) => store.set_remote_allowed(row, col, value),
            BulkTransform::SetApprovalNeeded(value) => store.set_approval_needed(row, col, value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BulkTransform::SetSupported(_) => "set_supported",
            BulkTransform::SetTime(_) => "set_time",
            BulkTransform::SetRemoteAllowed(_) => "set_remote_allowed",
            BulkTransform::SetApprovalNeeded(_) => "set_approval_needed",
        }
    }
}

/// Result of a bulk edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Cells the transform applied to, in application order
    pub affected: Vec<(BreedId, StationId)>,
    /// Rule rows sent in the batch (0 when nothing was affected)
    pub written: usize,
    /// Rows reverted or reloaded while the batch was in flight
    pub stale_rows: Vec<BreedId>,
}

impl BulkOutcome {
    pub fn is_noop(&self) -> bool {
        self.affected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_and_flags_skip_unsupported() {
        let mut store = MatrixStore::new();
        store.set_supported(1, 1, true);

        assert!(BulkTransform::SetTime(30).apply(&mut store, 1, 1));
        assert!(!BulkTransform::SetTime(30).apply(&mut store, 1, 2));
        assert!(BulkTransform::SetRemoteAllowed(true).apply(&mut store, 1, 1));
        assert!(!BulkTransform::SetApprovalNeeded(true).apply(&mut store, 1, 2));

        assert_eq!(store.get(1, 1).station_time, Some(30));
        assert_eq!(store.cell(1, 2), None);
    }

    #[test]
    fn test_set_supported_touches_every_cell() {
        let mut store = MatrixStore::new();
        assert!(BulkTransform::SetSupported(false).apply(&mut store, 1, 5));
        assert!(!store.get(1, 5).supported);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(BulkTransform::SetTime(45)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "set_time", "value": 45}));
    }
}
