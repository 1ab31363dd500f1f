//! Matrix view derivation: search, tag and status filters, row pages and
//! a sliding window over station columns

use crate::dirty::RowDirtiness;
use crate::duration::format_duration;
use crate::editor::{EditorState, MatrixEditor};
use crate::matrix::{Cell, SupportStatus};
use serde::{Deserialize, Serialize};
use shared::PaginatedResponse;
use shared::models::{Breed, Station, StationId, TagId, TagKind};
use std::collections::BTreeSet;

/// Filter and paging input for the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    /// Case-insensitive substring of the breed name
    pub search: Option<String>,
    /// Match any of these categories (empty = no filter)
    pub category_ids: BTreeSet<TagId>,
    /// Match any of these types (empty = no filter)
    pub type_ids: BTreeSet<TagId>,
    pub status: Option<SupportStatus>,
    /// Columns to show; active stations when empty
    pub selected_stations: Vec<StationId>,
    pub column_offset: usize,
    pub column_window: usize,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            search: None,
            category_ids: BTreeSet::new(),
            type_ids: BTreeSet::new(),
            status: None,
            selected_stations: Vec::new(),
            column_offset: 0,
            column_window: 6,
            page: 1,
            page_size: 25,
        }
    }
}

impl ViewFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: SupportStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn columns(mut self, offset: usize, window: usize) -> Self {
        self.column_offset = offset;
        self.column_window = window;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewCell {
    pub station_id: StationId,
    pub cell: Cell,
    /// "H:MM" for supported cells
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub breed: Breed,
    /// Support across every station, visible or not
    pub status: SupportStatus,
    pub dirty: RowDirtiness,
    pub saving: bool,
    pub cells: Vec<ViewCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixView {
    pub rows: Vec<ViewRow>,
    /// Stations inside the column window
    pub columns: Vec<Station>,
    /// Rows matching the filter across all pages
    pub total_rows: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_prev_columns: bool,
    pub has_next_columns: bool,
}

fn matches_tags(state: &EditorState, breed: &Breed, kind: TagKind, wanted: &BTreeSet<TagId>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    state
        .breed_tags
        .get(&breed.id)
        .and_then(|tags| tags.get(&kind))
        .is_some_and(|ids| !ids.is_disjoint(wanted))
}

/// Derive the visible grid from editor state
pub(crate) fn derive(state: &EditorState, filter: &ViewFilter) -> MatrixView {
    let base_columns: Vec<&Station> = if filter.selected_stations.is_empty() {
        state.stations.iter().filter(|s| s.is_active).collect()
    } else {
        state
            .stations
            .iter()
            .filter(|s| filter.selected_stations.contains(&s.id))
            .collect()
    };
    // Support status always spans every station, not just the visible ones
    let all_ids: Vec<StationId> = state.station_ids();

    let window = filter.column_window.clamp(1, base_columns.len().max(1));
    let offset = filter.column_offset.min(base_columns.len().saturating_sub(1));
    let columns: Vec<Station> = base_columns
        .iter()
        .skip(offset)
        .take(window)
        .map(|s| (*s).clone())
        .collect();

    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut breeds: Vec<&Breed> = state
        .breeds
        .values()
        .filter(|b| needle.as_ref().is_none_or(|n| b.name.to_lowercase().contains(n)))
        .filter(|b| matches_tags(state, b, TagKind::Category, &filter.category_ids))
        .filter(|b| matches_tags(state, b, TagKind::Type, &filter.type_ids))
        .filter(|b| {
            filter
                .status
                .is_none_or(|wanted| state.live.row_status(b.id, &all_ids) == wanted)
        })
        .collect();
    breeds.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)));

    let page = PaginatedResponse::from_items(breeds, filter.page, filter.page_size);
    let rows = page
        .data
        .iter()
        .map(|breed| {
            let cells = columns
                .iter()
                .map(|station| {
                    let cell = state.live.get(breed.id, station.id);
                    let display = cell.supported.then(|| {
                        format_duration(
                            cell.station_time
                                .unwrap_or_else(|| state.live.derived_default(breed.id)),
                        )
                    });
                    ViewCell {
                        station_id: station.id,
                        cell,
                        display,
                    }
                })
                .collect();
            ViewRow {
                breed: (*breed).clone(),
                status: state.live.row_status(breed.id, &all_ids),
                dirty: state.dirtiness(breed.id),
                saving: state.local.get(&breed.id).is_some_and(|l| l.saving),
                cells,
            }
        })
        .collect();

    MatrixView {
        rows,
        columns,
        total_rows: page.total,
        page: page.page,
        total_pages: page.total_pages,
        has_prev_columns: offset > 0,
        has_next_columns: offset.saturating_add(window) < base_columns.len(),
    }
}

impl MatrixEditor {
    /// Current page of the grid under `filter`
    pub fn view(&self, filter: &ViewFilter) -> MatrixView {
        let state = self.state.read();
        let view = derive(&state, filter);
        tracing::debug!(
            rows = view.rows.len(),
            total = view.total_rows,
            columns = view.columns.len(),
            "Matrix view derived"
        );
        view
    }
}
