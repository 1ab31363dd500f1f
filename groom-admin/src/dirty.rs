//! Dirty-state tracking between the live grid and the last-saved snapshot

use crate::matrix::{Cell, Row};
use serde::Serialize;
use shared::models::StationId;
use std::collections::BTreeSet;

/// Canonical form of a cell for comparison
///
/// An unsupported cell carries no time and no flags, and an absent
/// cell is the same as an unsupported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalCell {
    pub supported: bool,
    pub station_time: Option<u32>,
    pub remote_allowed: bool,
    pub approval_needed: bool,
}

pub fn normalize(cell: Option<&Cell>) -> NormalCell {
    match cell {
        Some(cell) if cell.supported => NormalCell {
            supported: true,
            station_time: cell.station_time,
            remote_allowed: cell.remote(),
            approval_needed: cell.approval(),
        },
        _ => NormalCell {
            supported: false,
            station_time: None,
            remote_allowed: false,
            approval_needed: false,
        },
    }
}

/// Columns whose normalized cells differ, over the union of both rows
pub fn dirty_columns(current: &Row, saved: &Row) -> Vec<StationId> {
    let columns: BTreeSet<StationId> = current.keys().chain(saved.keys()).copied().collect();
    columns
        .into_iter()
        .filter(|col| normalize(current.get(col)) != normalize(saved.get(col)))
        .collect()
}

pub fn is_row_dirty(current: &Row, saved: &Row) -> bool {
    let columns: BTreeSet<&StationId> = current.keys().chain(saved.keys()).collect();
    columns
        .into_iter()
        .any(|col| normalize(current.get(col)) != normalize(saved.get(col)))
}

/// Which parts of a row have unsaved edits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowDirtiness {
    pub matrix: bool,
    pub scalar: bool,
    pub tags: bool,
}

impl RowDirtiness {
    pub fn any(&self) -> bool {
        self.matrix || self.scalar || self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported(minutes: u32) -> Cell {
        Cell {
            supported: true,
            station_time: Some(minutes),
            remote_allowed: Some(false),
            approval_needed: Some(false),
            ..Cell::default()
        }
    }

    #[test]
    fn test_unsupported_fields_are_ignored() {
        let mut current = Row::new();
        current.insert(1, Cell {
            supported: false,
            station_time: Some(90),
            remote_allowed: Some(true),
            approval_needed: None,
            default_time: Some(60),
        });
        let saved = Row::new();
        assert!(!is_row_dirty(&current, &saved));
        assert!(dirty_columns(&current, &saved).is_empty());
    }

    #[test]
    fn test_default_time_is_not_compared() {
        let mut current = Row::new();
        let mut saved = Row::new();
        current.insert(1, Cell { default_time: Some(30), ..supported(45) });
        saved.insert(1, supported(45));
        assert!(!is_row_dirty(&current, &saved));
    }

    #[test]
    fn test_missing_flags_equal_false() {
        let mut current = Row::new();
        let mut saved = Row::new();
        current.insert(1, Cell { remote_allowed: None, ..supported(45) });
        saved.insert(1, supported(45));
        assert!(!is_row_dirty(&current, &saved));
    }

    #[test]
    fn test_detects_changes_over_key_union() {
        let mut current = Row::new();
        let mut saved = Row::new();
        current.insert(1, supported(45));
        saved.insert(1, supported(45));
        saved.insert(2, supported(30));
        current.insert(3, supported(60));
        current.insert(4, Cell { remote_allowed: Some(true), ..supported(45) });
        saved.insert(4, supported(45));

        assert!(is_row_dirty(&current, &saved));
        assert_eq!(dirty_columns(&current, &saved), vec![2, 3, 4]);
    }

    #[test]
    fn test_row_dirtiness_any() {
        assert!(!RowDirtiness::default().any());
        assert!(RowDirtiness { tags: true, ..Default::default() }.any());
    }
}
