//! Matrix Store
//!
//! Two-level map `breed -> station -> Cell` holding the capability grid.
//! The live grid and the last-saved snapshot are separate owned values;
//! cloning a store or row never shares cells.

use crate::duration::{DEFAULT_MINUTES, MAX_MINUTES, parse_duration};
use serde::{Deserialize, Serialize};
use shared::models::{BreedId, StationBreedRule, StationId};
use std::collections::BTreeMap;

/// One breed × station cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub supported: bool,
    /// Row default in effect when the cell was loaded or switched on
    pub default_time: Option<u32>,
    /// Explicit grooming time at this station
    pub station_time: Option<u32>,
    pub remote_allowed: Option<bool>,
    pub approval_needed: Option<bool>,
}

impl Cell {
    pub fn remote(&self) -> bool {
        self.remote_allowed.unwrap_or(false)
    }

    pub fn approval(&self) -> bool {
        self.approval_needed.unwrap_or(false)
    }

    fn from_rule(rule: &StationBreedRule) -> Self {
        Self {
            supported: rule.is_active,
            default_time: None,
            station_time: Some(rule.duration_modifier_minutes.max(0) as u32),
            remote_allowed: Some(rule.remote_booking_allowed),
            approval_needed: Some(rule.requires_staff_approval),
        }
    }
}

/// Cells of one breed keyed by station
pub type Row = BTreeMap<StationId, Cell>;

/// Aggregate support of a breed across stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    None,
    Some,
    All,
}

/// What to write as the duration of an unsupported cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactiveDuration {
    /// Write 0 (full-matrix save)
    Zero,
    /// Write the value the cell already carries (row and bulk saves)
    Keep,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixStore {
    rows: BTreeMap<BreedId, Row>,
}

impl MatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid with one row per breed from persisted rules
    pub fn from_rules(breeds: &[BreedId], rules: &[StationBreedRule]) -> Self {
        let mut store = Self::new();
        for breed in breeds {
            store.rows.entry(*breed).or_default();
        }
        for rule in rules {
            store
                .rows
                .entry(rule.breed_id)
                .or_default()
                .insert(rule.station_id, Cell::from_rule(rule));
        }
        let ids: Vec<BreedId> = store.rows.keys().copied().collect();
        for breed in ids {
            let default = store.derived_default(breed);
            if let Some(row) = store.rows.get_mut(&breed) {
                for cell in row.values_mut() {
                    cell.default_time = Some(default);
                }
            }
        }
        store
    }

    pub fn contains_row(&self, row: BreedId) -> bool {
        self.rows.contains_key(&row)
    }

    pub fn row_ids(&self) -> impl Iterator<Item = BreedId> + '_ {
        self.rows.keys().copied()
    }

    pub fn row(&self, row: BreedId) -> Option<&Row> {
        self.rows.get(&row)
    }

    pub fn ensure_row(&mut self, row: BreedId) {
        self.rows.entry(row).or_default();
    }

    pub fn remove_row(&mut self, row: BreedId) -> Option<Row> {
        self.rows.remove(&row)
    }

    /// Drop a station from every row
    pub fn remove_column(&mut self, col: StationId) {
        for row in self.rows.values_mut() {
            row.remove(&col);
        }
    }

    /// Cell at (row, col); an empty unsupported cell when absent
    pub fn get(&self, row: BreedId, col: StationId) -> Cell {
        self.cell(row, col).cloned().unwrap_or_default()
    }

    pub fn cell(&self, row: BreedId, col: StationId) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Replace or remove a single cell
    pub fn put_cell(&mut self, row: BreedId, col: StationId, cell: Option<Cell>) {
        match cell {
            Some(cell) => {
                self.rows.entry(row).or_default().insert(col, cell);
            }
            None => {
                if let Some(r) = self.rows.get_mut(&row) {
                    r.remove(&col);
                }
            }
        }
    }

    fn cell_mut(&mut self, row: BreedId, col: StationId) -> &mut Cell {
        self.rows.entry(row).or_default().entry(col).or_default()
    }

    /// Flip support. Switching on seeds the station time from the row
    /// default; switching off clears the booking flags.
    pub fn set_supported(&mut self, row: BreedId, col: StationId, value: bool) {
        let default = self.derived_default(row);
        let cell = self.cell_mut(row, col);
        if value {
            if !cell.supported {
                cell.station_time = Some(default);
                cell.default_time = Some(default);
            }
            cell.supported = true;
        } else {
            cell.supported = false;
            cell.remote_allowed = Some(false);
            cell.approval_needed = Some(false);
        }
    }

    /// Set the station time; negative or oversized input is ignored
    pub fn set_time(&mut self, row: BreedId, col: StationId, minutes: i64) -> bool {
        let Ok(minutes) = u32::try_from(minutes) else {
            return false;
        };
        if minutes > MAX_MINUTES {
            return false;
        }
        self.cell_mut(row, col).station_time = Some(minutes);
        true
    }

    /// Set the station time from "H:MM" text; unparseable text is ignored
    pub fn set_time_display(&mut self, row: BreedId, col: StationId, text: &str) -> bool {
        match parse_duration(text) {
            Some(minutes) => self.set_time(row, col, i64::from(minutes)),
            None => false,
        }
    }

    /// Only supported cells may allow remote booking
    pub fn set_remote_allowed(&mut self, row: BreedId, col: StationId, value: bool) -> bool {
        match self.supported_cell_mut(row, col) {
            Some(cell) => {
                cell.remote_allowed = Some(value);
                true
            }
            None => false,
        }
    }

    /// Only supported cells may require approval
    pub fn set_approval_needed(&mut self, row: BreedId, col: StationId, value: bool) -> bool {
        match self.supported_cell_mut(row, col) {
            Some(cell) => {
                cell.approval_needed = Some(value);
                true
            }
            None => false,
        }
    }

    fn supported_cell_mut(&mut self, row: BreedId, col: StationId) -> Option<&mut Cell> {
        self.rows
            .get_mut(&row)
            .and_then(|r| r.get_mut(&col))
            .filter(|cell| cell.supported)
    }

    /// Overwrite the time of every supported cell in the row
    pub fn apply_default_to_all_in_row(&mut self, row: BreedId, minutes: u32) -> Vec<StationId> {
        let Some(cells) = self.rows.get_mut(&row).filter(|_| minutes <= MAX_MINUTES) else {
            return Vec::new();
        };
        cells
            .iter_mut()
            .filter(|(_, cell)| cell.supported)
            .map(|(col, cell)| {
                cell.station_time = Some(minutes);
                *col
            })
            .collect()
    }

    /// Owned copy of one row
    pub fn clone_row(&self, row: BreedId) -> Row {
        self.rows.get(&row).cloned().unwrap_or_default()
    }

    /// Owned copy of the whole grid
    pub fn clone_all(&self) -> MatrixStore {
        self.clone()
    }

    pub fn restore_row(&mut self, row: BreedId, cells: Row) {
        self.rows.insert(row, cells);
    }

    /// Overwrite the given cells, leaving the rest of the row alone
    ///
    /// `None` clears a cell.
    pub fn merge_cells(&mut self, row: BreedId, cells: impl IntoIterator<Item = (StationId, Option<Cell>)>) {
        for (col, cell) in cells {
            self.put_cell(row, col, cell);
        }
    }

    /// Mode of the station times over supported cells
    ///
    /// Ties go to the smaller duration; a row without supported, timed
    /// cells defaults to 60 minutes.
    pub fn derived_default(&self, row: BreedId) -> u32 {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for cell in self.rows.get(&row).into_iter().flat_map(|r| r.values()) {
            if cell.supported
                && let Some(minutes) = cell.station_time
            {
                *counts.entry(minutes).or_insert(0) += 1;
            }
        }

        // Ascending iteration plus strict comparison keeps the smallest on ties
        let mut best: Option<(u32, usize)> = None;
        for (minutes, count) in counts {
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((minutes, count));
            }
        }
        best.map(|(minutes, _)| minutes).unwrap_or(DEFAULT_MINUTES)
    }

    /// Support status of the row across the given stations
    pub fn row_status(&self, row: BreedId, stations: &[StationId]) -> SupportStatus {
        let supported = stations
            .iter()
            .filter(|col| self.cell(row, **col).is_some_and(|c| c.supported))
            .count();
        match supported {
            0 => SupportStatus::None,
            n if n == stations.len() => SupportStatus::All,
            _ => SupportStatus::Some,
        }
    }

    /// Full rule row for a cell
    ///
    /// Supported cells without an explicit time fall back to the row's
    /// derived default.
    pub fn to_rule(&self, row: BreedId, col: StationId, inactive: InactiveDuration) -> StationBreedRule {
        let cell = self.get(row, col);
        let minutes = if cell.supported {
            cell.station_time.unwrap_or_else(|| self.derived_default(row))
        } else {
            match inactive {
                InactiveDuration::Zero => 0,
                InactiveDuration::Keep => cell.station_time.unwrap_or(0),
            }
        };

        StationBreedRule {
            station_id: col,
            breed_id: row,
            is_active: cell.supported,
            remote_booking_allowed: cell.supported && cell.remote(),
            requires_staff_approval: cell.supported && cell.approval(),
            duration_modifier_minutes: i32::try_from(minutes.min(MAX_MINUTES)).unwrap_or(i32::MAX),
        }
    }
}
