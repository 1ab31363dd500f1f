//! Matrix Editor - live grid, last-saved snapshot and per-row edit state
//!
//! All state sits behind one `Arc<RwLock<_>>`; the lock is only taken
//! between network calls, never across them. Each row carries a request
//! generation that `revert_row`, `reload` and row deletion bump, and a
//! response whose generation no longer matches is dropped without
//! touching the row.

use crate::audit_log;
use crate::bulk::{BulkOutcome, BulkTransform};
use crate::dirty::{RowDirtiness, dirty_columns, is_row_dirty};
use crate::duration::resolve_duration;
use crate::matrix::{Cell, InactiveDuration, MatrixStore, SupportStatus};
use crate::repository::Repositories;
use groom_client::Persistence;
use parking_lot::RwLock;
use serde::Serialize;
use shared::models::{
    Breed, BreedCreate, BreedId, BreedUpdate, Station, StationBreedRule, StationCreate, StationId,
    Tag, TagId, TagKind, TagLink,
};
use shared::{AppError, AppResult, ErrorCode};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

// =============================================================================
// Types
// =============================================================================

/// Per-row view-model state
#[derive(Debug, Clone, Default)]
pub struct LocalEditState {
    /// A row save is in flight
    pub saving: bool,
    /// Raw duration text typed into cells, not yet committed
    pub pending_input: BTreeMap<StationId, String>,
    /// Unsaved scalar edits
    pub draft: Option<BreedUpdate>,
    /// Unsaved tag selections
    pub tag_drafts: BTreeMap<TagKind, BTreeSet<TagId>>,
    /// Request generation of the row
    pub generation: u64,
    /// Error of the last failed operation on the row
    pub last_error: Option<AppError>,
}

/// Result of a row save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub rules_written: usize,
    pub scalar_saved: bool,
    pub tags_replaced: Vec<TagKind>,
    /// The row was reverted or reloaded while the save was in flight
    pub stale: bool,
}

/// Result of a full-matrix save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveAllOutcome {
    pub rows: Vec<BreedId>,
    pub rules_written: usize,
    /// Rows skipped because a row save was in flight
    pub skipped_busy: Vec<BreedId>,
    pub stale_rows: Vec<BreedId>,
}

/// Everything read from the backend on load
pub(crate) struct Snapshot {
    pub breeds: Vec<Breed>,
    pub stations: Vec<Station>,
    pub rules: Vec<StationBreedRule>,
    pub tags: BTreeMap<TagKind, Vec<Tag>>,
    pub links: BTreeMap<TagKind, Vec<TagLink>>,
}

#[derive(Debug, Default)]
pub(crate) struct EditorState {
    pub breeds: BTreeMap<BreedId, Breed>,
    /// Ordered by display_order
    pub stations: Vec<Station>,
    pub tags: BTreeMap<TagKind, Vec<Tag>>,
    /// Persisted tag links per breed
    pub breed_tags: HashMap<BreedId, BTreeMap<TagKind, BTreeSet<TagId>>>,
    pub live: MatrixStore,
    pub saved: MatrixStore,
    pub local: HashMap<BreedId, LocalEditState>,
}

impl EditorState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = Self::default();
        state.install(snapshot);
        state
    }

    /// Replace all loaded data, dropping drafts and bumping every generation
    pub fn install(&mut self, snapshot: Snapshot) {
        let breed_ids: Vec<BreedId> = snapshot.breeds.iter().map(|b| b.id).collect();
        let known_breeds: HashSet<BreedId> = breed_ids.iter().copied().collect();
        let known_stations: HashSet<StationId> = snapshot.stations.iter().map(|s| s.id).collect();
        let rules: Vec<StationBreedRule> = snapshot
            .rules
            .into_iter()
            .filter(|r| known_breeds.contains(&r.breed_id) && known_stations.contains(&r.station_id))
            .collect();

        self.live = MatrixStore::from_rules(&breed_ids, &rules);
        self.saved = self.live.clone_all();
        self.breeds = snapshot.breeds.into_iter().map(|b| (b.id, b)).collect();
        self.stations = snapshot.stations;
        self.sort_stations();
        self.tags = snapshot.tags;

        self.breed_tags.clear();
        for (kind, links) in snapshot.links {
            for link in links.into_iter().filter(|l| known_breeds.contains(&l.breed_id)) {
                self.breed_tags
                    .entry(link.breed_id)
                    .or_default()
                    .entry(kind)
                    .or_default()
                    .insert(link.tag_id);
            }
        }

        // Rows never edited still need a fresh generation so a request
        // sent before the reload cannot land on the new data.
        let rows: BTreeSet<BreedId> = self.local.keys().copied().chain(breed_ids).collect();
        for row in rows {
            self.reset_local(row);
        }
    }

    pub fn sort_stations(&mut self) {
        self.stations
            .sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.id.cmp(&b.id)));
    }

    pub fn ensure_row(&self, row: BreedId) -> AppResult<()> {
        if self.breeds.contains_key(&row) {
            Ok(())
        } else {
            Err(AppError::row_not_loaded(row))
        }
    }

    pub fn ensure_station(&self, col: StationId) -> AppResult<()> {
        if self.stations.iter().any(|s| s.id == col) {
            Ok(())
        } else {
            Err(AppError::station_not_found(col))
        }
    }

    pub fn station_ids(&self) -> Vec<StationId> {
        self.stations.iter().map(|s| s.id).collect()
    }

    pub fn generation(&self, row: BreedId) -> u64 {
        self.local.get(&row).map(|l| l.generation).unwrap_or(0)
    }

    pub fn local_mut(&mut self, row: BreedId) -> &mut LocalEditState {
        self.local.entry(row).or_default()
    }

    /// Drop all local edit state of a row and invalidate in-flight responses
    pub fn reset_local(&mut self, row: BreedId) {
        let generation = self.generation(row) + 1;
        self.local.insert(
            row,
            LocalEditState {
                generation,
                ..Default::default()
            },
        );
    }

    pub fn saved_tags(&self, row: BreedId, kind: TagKind) -> BTreeSet<TagId> {
        self.breed_tags
            .get(&row)
            .and_then(|tags| tags.get(&kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn dirtiness(&self, row: BreedId) -> RowDirtiness {
        let matrix = is_row_dirty(&self.live.clone_row(row), &self.saved.clone_row(row));
        let Some(local) = self.local.get(&row) else {
            return RowDirtiness {
                matrix,
                ..Default::default()
            };
        };

        let scalar = match (&local.draft, self.breeds.get(&row)) {
            (Some(draft), Some(breed)) => {
                let mut edited = breed.clone();
                edited.apply(draft.clone());
                edited != *breed
            }
            _ => false,
        };
        let tags = local
            .tag_drafts
            .iter()
            .any(|(kind, ids)| *ids != self.saved_tags(row, *kind));

        RowDirtiness {
            matrix,
            scalar,
            tags,
        }
    }
}

/// Work captured for one row save
struct RowSavePlan {
    generation: u64,
    /// Cells as sent, folded into the snapshot on success
    cells: Vec<(StationId, Option<Cell>)>,
    rules: Vec<StationBreedRule>,
    scalar: Option<BreedUpdate>,
    tags: Vec<(TagKind, BTreeSet<TagId>)>,
}

impl RowSavePlan {
    fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.scalar.is_none() && self.tags.is_empty()
    }
}

/// Cell touched by a bulk edit
struct TouchedCell {
    row: BreedId,
    col: StationId,
    before: Option<Cell>,
    after: Option<Cell>,
}

// =============================================================================
// MatrixEditor
// =============================================================================

/// Breed × station matrix editor over a persistence backend
#[derive(Clone)]
pub struct MatrixEditor {
    pub(crate) repos: Repositories,
    pub(crate) state: Arc<RwLock<EditorState>>,
}

impl std::fmt::Debug for MatrixEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MatrixEditor")
            .field("breeds", &state.breeds.len())
            .field("stations", &state.stations.len())
            .finish()
    }
}

impl MatrixEditor {
    /// Load every breed, station, rule and tag
    pub async fn load(db: Arc<dyn Persistence>) -> AppResult<Self> {
        let editor = Self {
            repos: Repositories::new(db),
            state: Arc::new(RwLock::new(EditorState::default())),
        };
        editor.reload().await?;
        Ok(editor)
    }

    /// Re-read everything, discarding local edits
    pub async fn reload(&self) -> AppResult<()> {
        let snapshot = self.fetch().await?;
        let breeds = snapshot.breeds.len();
        let stations = snapshot.stations.len();
        let rules = snapshot.rules.len();
        self.state.write().install(snapshot);
        tracing::info!(breeds, stations, rules, "Matrix loaded");
        Ok(())
    }

    async fn fetch(&self) -> AppResult<Snapshot> {
        let repos = &self.repos;
        let (breeds, stations, rules, categories, types, category_links, type_links) = futures::try_join!(
            repos.breeds.find_all(),
            repos.stations.find_all(),
            repos.rules.find_all(),
            repos.tags.find_all(TagKind::Category),
            repos.tags.find_all(TagKind::Type),
            repos.tags.links(TagKind::Category),
            repos.tags.links(TagKind::Type),
        )?;

        Ok(Snapshot {
            breeds,
            stations,
            rules,
            tags: BTreeMap::from([(TagKind::Category, categories), (TagKind::Type, types)]),
            links: BTreeMap::from([(TagKind::Category, category_links), (TagKind::Type, type_links)]),
        })
    }

    // ========== Read access ==========

    pub fn breeds(&self) -> Vec<Breed> {
        self.state.read().breeds.values().cloned().collect()
    }

    pub fn breed(&self, row: BreedId) -> Option<Breed> {
        self.state.read().breeds.get(&row).cloned()
    }

    /// Stations in display order
    pub fn stations(&self) -> Vec<Station> {
        self.state.read().stations.clone()
    }

    pub fn tags(&self, kind: TagKind) -> Vec<Tag> {
        self.state.read().tags.get(&kind).cloned().unwrap_or_default()
    }

    pub fn cell(&self, row: BreedId, col: StationId) -> Cell {
        self.state.read().live.get(row, col)
    }

    pub fn saved_cell(&self, row: BreedId, col: StationId) -> Cell {
        self.state.read().saved.get(row, col)
    }

    /// Owned copy of the live grid
    pub fn live_snapshot(&self) -> MatrixStore {
        self.state.read().live.clone_all()
    }

    /// Owned copy of the last-saved grid
    pub fn saved_snapshot(&self) -> MatrixStore {
        self.state.read().saved.clone_all()
    }

    pub fn derived_default(&self, row: BreedId) -> u32 {
        self.state.read().live.derived_default(row)
    }

    /// Support status across all stations
    pub fn row_status(&self, row: BreedId) -> SupportStatus {
        let state = self.state.read();
        state.live.row_status(row, &state.station_ids())
    }

    pub fn local_state(&self, row: BreedId) -> LocalEditState {
        self.state.read().local.get(&row).cloned().unwrap_or_default()
    }

    pub fn dirtiness(&self, row: BreedId) -> RowDirtiness {
        self.state.read().dirtiness(row)
    }

    pub fn is_row_dirty(&self, row: BreedId) -> bool {
        self.dirtiness(row).any()
    }

    pub fn dirty_rows(&self) -> Vec<BreedId> {
        let state = self.state.read();
        state
            .breeds
            .keys()
            .copied()
            .filter(|row| state.dirtiness(*row).any())
            .collect()
    }

    /// Tags of a breed, draft selection first
    pub fn breed_tags(&self, row: BreedId, kind: TagKind) -> BTreeSet<TagId> {
        let state = self.state.read();
        state
            .local
            .get(&row)
            .and_then(|l| l.tag_drafts.get(&kind).cloned())
            .unwrap_or_else(|| state.saved_tags(row, kind))
    }

    // ========== Local edits ==========

    fn edit<T>(
        &self,
        row: BreedId,
        col: StationId,
        f: impl FnOnce(&mut MatrixStore) -> T,
    ) -> AppResult<T> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        state.ensure_station(col)?;
        Ok(f(&mut state.live))
    }

    pub fn set_supported(&self, row: BreedId, col: StationId, value: bool) -> AppResult<()> {
        self.edit(row, col, |live| live.set_supported(row, col, value))
    }

    /// Returns false when the value was rejected
    pub fn set_time(&self, row: BreedId, col: StationId, minutes: i64) -> AppResult<bool> {
        self.edit(row, col, |live| live.set_time(row, col, minutes))
    }

    /// Returns false on unsupported cells
    pub fn set_remote_allowed(&self, row: BreedId, col: StationId, value: bool) -> AppResult<bool> {
        self.edit(row, col, |live| live.set_remote_allowed(row, col, value))
    }

    /// Returns false on unsupported cells
    pub fn set_approval_needed(&self, row: BreedId, col: StationId, value: bool) -> AppResult<bool> {
        self.edit(row, col, |live| live.set_approval_needed(row, col, value))
    }

    pub fn apply_default_to_all_in_row(&self, row: BreedId, minutes: u32) -> AppResult<Vec<StationId>> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        Ok(state.live.apply_default_to_all_in_row(row, minutes))
    }

    /// Keep raw duration text for a cell until it is committed
    pub fn type_duration(&self, row: BreedId, col: StationId, text: &str) -> AppResult<()> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        state.ensure_station(col)?;
        state.local_mut(row).pending_input.insert(col, text.to_string());
        Ok(())
    }

    /// Commit typed text; malformed text keeps the last valid value
    pub fn commit_duration(&self, row: BreedId, col: StationId) -> AppResult<u32> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        let last_valid = state
            .live
            .cell(row, col)
            .and_then(|c| c.station_time)
            .unwrap_or_else(|| state.live.derived_default(row));

        let Some(text) = state.local_mut(row).pending_input.remove(&col) else {
            return Ok(last_valid);
        };
        if !state.live.set_time_display(row, col, &text) {
            tracing::debug!(breed_id = row, station_id = col, text = %text, "Ignoring malformed duration");
        }
        Ok(resolve_duration(&text, last_valid))
    }

    /// Stage scalar edits, layered over any earlier draft
    pub fn stage_breed_update(&self, row: BreedId, update: BreedUpdate) -> AppResult<()> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        let local = state.local_mut(row);
        match &mut local.draft {
            Some(draft) => draft.merge(update),
            None => local.draft = Some(update),
        }
        Ok(())
    }

    /// Stage the full tag selection of one kind
    pub fn stage_tags(
        &self,
        row: BreedId,
        kind: TagKind,
        tag_ids: impl IntoIterator<Item = TagId>,
    ) -> AppResult<()> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        let ids: BTreeSet<TagId> = tag_ids.into_iter().collect();
        if let Some(known) = state.tags.get(&kind)
            && let Some(unknown) = ids.iter().find(|id| !known.iter().any(|t| t.id == **id))
        {
            return Err(AppError::new(ErrorCode::TagNotFound).with_detail("tag_id", *unknown));
        }
        state.local_mut(row).tag_drafts.insert(kind, ids);
        Ok(())
    }

    /// Restore the row from the snapshot and drop every draft, locally only
    pub fn revert_row(&self, row: BreedId) -> AppResult<()> {
        let mut state = self.state.write();
        state.ensure_row(row)?;
        let cells = state.saved.clone_row(row);
        state.live.restore_row(row, cells);
        state.reset_local(row);
        tracing::debug!(breed_id = row, "Row reverted");
        Ok(())
    }

    // ========== Bulk edits ==========

    /// Apply a transform across columns of one row and persist it as one batch
    pub async fn apply_bulk(
        &self,
        row: BreedId,
        columns: &[StationId],
        transform: BulkTransform,
    ) -> AppResult<BulkOutcome> {
        let cells = columns.iter().map(|col| (row, *col)).collect();
        self.apply_bulk_cells(cells, transform).await
    }

    /// Apply a transform down one column across rows
    pub async fn apply_bulk_column(
        &self,
        col: StationId,
        rows: &[BreedId],
        transform: BulkTransform,
    ) -> AppResult<BulkOutcome> {
        let cells = rows.iter().map(|row| (*row, col)).collect();
        self.apply_bulk_cells(cells, transform).await
    }

    async fn apply_bulk_cells(
        &self,
        cells: Vec<(BreedId, StationId)>,
        transform: BulkTransform,
    ) -> AppResult<BulkOutcome> {
        let (generations, touched, rules) = {
            let mut state = self.state.write();
            for (row, col) in &cells {
                state.ensure_row(*row)?;
                state.ensure_station(*col)?;
            }

            let mut seen = HashSet::new();
            let mut generations: HashMap<BreedId, u64> = HashMap::new();
            let mut touched = Vec::new();
            for (row, col) in cells {
                if !seen.insert((row, col)) {
                    continue;
                }
                let before = state.live.cell(row, col).cloned();
                if transform.apply(&mut state.live, row, col) {
                    let generation = state.generation(row);
                    generations.entry(row).or_insert(generation);
                    touched.push(TouchedCell {
                        row,
                        col,
                        before,
                        after: state.live.cell(row, col).cloned(),
                    });
                }
            }

            if touched.is_empty() {
                tracing::debug!(transform = transform.name(), "Bulk edit touched no cells");
                return Ok(BulkOutcome::default());
            }
            let rules: Vec<StationBreedRule> = touched
                .iter()
                .map(|t| state.live.to_rule(t.row, t.col, InactiveDuration::Keep))
                .collect();
            (generations, touched, rules)
        };

        let result = self.repos.rules.upsert(&rules).await;

        let mut state = self.state.write();
        let stale_rows: Vec<BreedId> = generations
            .iter()
            .filter(|(row, generation)| state.generation(**row) != **generation)
            .map(|(row, _)| *row)
            .collect();
        if !stale_rows.is_empty() {
            tracing::warn!(rows = ?stale_rows, "Discarding stale bulk response");
        }
        let affected = touched.iter().map(|t| (t.row, t.col)).collect();

        match result {
            Ok(_) => {
                for t in touched.into_iter().filter(|t| !stale_rows.contains(&t.row)) {
                    state.saved.put_cell(t.row, t.col, t.after);
                }
                audit_log!(
                    "bulk_upsert",
                    "station_breed_rules",
                    format!("transform={} rules={}", transform.name(), rules.len())
                );
                Ok(BulkOutcome {
                    affected,
                    written: rules.len(),
                    stale_rows,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, transform = transform.name(), "Bulk rule upsert failed");
                for t in touched.into_iter().filter(|t| !stale_rows.contains(&t.row)) {
                    state.live.put_cell(t.row, t.col, t.before);
                    state.local_mut(t.row).last_error = Some(e.clone());
                }
                Err(e)
            }
        }
    }

    // ========== Saving ==========

    fn plan_row_save(state: &EditorState, row: BreedId) -> AppResult<RowSavePlan> {
        let local = state.local.get(&row);

        let mut scalar = None;
        if let (Some(draft), Some(breed)) = (local.and_then(|l| l.draft.as_ref()), state.breeds.get(&row)) {
            let mut edited = breed.clone();
            edited.apply(draft.clone());
            if edited != *breed {
                edited.validate_fields()?;
                scalar = Some(draft.clone());
            }
        }

        let tags = local
            .map(|l| {
                l.tag_drafts
                    .iter()
                    .filter(|(kind, ids)| **ids != state.saved_tags(row, **kind))
                    .map(|(kind, ids)| (*kind, ids.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let columns = dirty_columns(&state.live.clone_row(row), &state.saved.clone_row(row));
        let cells = columns
            .iter()
            .map(|col| (*col, state.live.cell(row, *col).cloned()))
            .collect();
        let rules = columns
            .iter()
            .map(|col| state.live.to_rule(row, *col, InactiveDuration::Keep))
            .collect();

        Ok(RowSavePlan {
            generation: state.generation(row),
            cells,
            rules,
            scalar,
            tags,
        })
    }

    /// Persist one row: dirty rules first, then scalar fields, then tags
    ///
    /// Validation runs before any call. The steps are not atomic: when a
    /// later step fails the earlier ones stay persisted and the failed
    /// drafts are discarded locally.
    pub async fn save_row(&self, row: BreedId) -> AppResult<SaveOutcome> {
        let plan = {
            let mut state = self.state.write();
            state.ensure_row(row)?;
            if state.local.get(&row).is_some_and(|l| l.saving) {
                return Err(AppError::new(ErrorCode::RowBusy).with_detail("breed_id", row));
            }
            let plan = Self::plan_row_save(&state, row)?;
            if plan.is_empty() {
                return Ok(SaveOutcome::default());
            }
            let local = state.local_mut(row);
            local.saving = true;
            local.last_error = None;
            plan
        };
        let generation = plan.generation;

        let result = self.execute_row_save(row, plan).await;

        let mut state = self.state.write();
        if state.generation(row) == generation {
            let local = state.local_mut(row);
            local.saving = false;
            if let Err(e) = &result {
                local.last_error = Some(e.clone());
            }
        }
        result
    }

    async fn execute_row_save(&self, row: BreedId, plan: RowSavePlan) -> AppResult<SaveOutcome> {
        let mut outcome = SaveOutcome::default();
        let stale = |mut outcome: SaveOutcome| -> AppResult<SaveOutcome> {
            tracing::warn!(breed_id = row, "Discarding stale save response");
            outcome.stale = true;
            Ok(outcome)
        };

        if !plan.rules.is_empty() {
            let result = self.repos.rules.upsert(&plan.rules).await;
            let mut state = self.state.write();
            if state.generation(row) != plan.generation {
                return stale(outcome);
            }
            if let Err(e) = result {
                tracing::error!(breed_id = row, error = %e, "Row rule save failed");
                return Err(e);
            }
            state.saved.merge_cells(row, plan.cells.iter().cloned());
            outcome.rules_written = plan.rules.len();
        }

        if let Some(update) = plan.scalar {
            let result = self.repos.breeds.update(row, update).await;
            let mut state = self.state.write();
            if state.generation(row) != plan.generation {
                return stale(outcome);
            }
            match result {
                Ok(breed) => {
                    state.breeds.insert(row, breed);
                    state.local_mut(row).draft = None;
                    outcome.scalar_saved = true;
                }
                Err(e) => {
                    tracing::error!(breed_id = row, error = %e, "Breed update failed, discarding draft");
                    let local = state.local_mut(row);
                    local.draft = None;
                    local.tag_drafts.clear();
                    return Err(e);
                }
            }
        }

        for (kind, ids) in plan.tags {
            let result = self.repos.tags.replace_links(kind, row, &ids).await;
            let mut state = self.state.write();
            if state.generation(row) != plan.generation {
                return stale(outcome);
            }
            match result {
                Ok(()) => {
                    state.breed_tags.entry(row).or_default().insert(kind, ids);
                    state.local_mut(row).tag_drafts.remove(&kind);
                    outcome.tags_replaced.push(kind);
                }
                Err(e) => {
                    tracing::error!(breed_id = row, error = %e, "Tag replacement failed, discarding draft");
                    state.local_mut(row).tag_drafts.clear();
                    return Err(e);
                }
            }
        }

        audit_log!(
            "save_row",
            format!("breed:{}", row),
            format!(
                "rules={} scalar={} tags={}",
                outcome.rules_written,
                outcome.scalar_saved,
                outcome.tags_replaced.len()
            )
        );
        Ok(outcome)
    }

    /// Persist every row with matrix edits in one batch
    ///
    /// Writes each cell of those rows and zeroes the duration of
    /// unsupported cells. Scalar and tag drafts are left to `save_row`.
    pub async fn save_all(&self) -> AppResult<SaveAllOutcome> {
        let mut outcome = SaveAllOutcome::default();
        // (row, generation, [(col, cell as planned, cell as persisted)])
        let mut plan: Vec<(BreedId, u64, Vec<(StationId, Option<Cell>, Cell)>)> = Vec::new();
        let mut rules = Vec::new();
        {
            let mut state = self.state.write();
            let rows: Vec<BreedId> = state.live.row_ids().collect();
            for row in rows {
                let live = state.live.clone_row(row);
                let saved = state.saved.clone_row(row);
                if !is_row_dirty(&live, &saved) {
                    continue;
                }
                if state.local.get(&row).is_some_and(|l| l.saving) {
                    outcome.skipped_busy.push(row);
                    continue;
                }

                let columns: BTreeSet<StationId> = live.keys().chain(saved.keys()).copied().collect();
                let mut cells = Vec::with_capacity(columns.len());
                for col in columns {
                    let rule = state.live.to_rule(row, col, InactiveDuration::Zero);
                    let current = live.get(&col).cloned();
                    let persisted = Cell {
                        supported: rule.is_active,
                        default_time: current.as_ref().and_then(|c| c.default_time),
                        station_time: Some(rule.duration_modifier_minutes.max(0) as u32),
                        remote_allowed: Some(rule.remote_booking_allowed),
                        approval_needed: Some(rule.requires_staff_approval),
                    };
                    rules.push(rule);
                    cells.push((col, current, persisted));
                }
                plan.push((row, state.generation(row), cells));
            }
            // Rows in the batch count as saving until the response lands
            for (row, _, _) in &plan {
                let local = state.local_mut(*row);
                local.saving = true;
                local.last_error = None;
            }
        }

        if rules.is_empty() {
            return Ok(outcome);
        }

        let result = self.repos.rules.upsert(&rules).await;

        let mut state = self.state.write();
        if let Err(e) = result {
            tracing::error!(error = %e, rows = plan.len(), "Full matrix save failed");
            for (row, generation, _) in &plan {
                if state.generation(*row) == *generation {
                    let local = state.local_mut(*row);
                    local.saving = false;
                    local.last_error = Some(e.clone());
                }
            }
            return Err(e);
        }

        for (row, generation, cells) in plan {
            if state.generation(row) != generation {
                tracing::warn!(breed_id = row, "Discarding stale save response");
                outcome.stale_rows.push(row);
                continue;
            }
            state.local_mut(row).saving = false;
            for (col, planned, persisted) in cells {
                if state.live.cell(row, col) == planned.as_ref() {
                    state.live.put_cell(row, col, Some(persisted.clone()));
                }
                state.saved.put_cell(row, col, Some(persisted));
            }
            outcome.rows.push(row);
        }
        outcome.rules_written = rules.len();

        audit_log!(
            "save_all",
            "station_breed_rules",
            format!("rows={} rules={}", outcome.rows.len(), outcome.rules_written)
        );
        Ok(outcome)
    }

    // ========== Rows and columns ==========

    /// Create a breed and add an empty row for it
    pub async fn add_breed(&self, data: BreedCreate) -> AppResult<Breed> {
        let breed = self.repos.breeds.create(data).await?;
        let mut state = self.state.write();
        state.live.ensure_row(breed.id);
        state.saved.ensure_row(breed.id);
        state.breeds.insert(breed.id, breed.clone());
        audit_log!("create", format!("breed:{}", breed.id));
        Ok(breed)
    }

    /// Delete a breed with its rules and links, then drop its row
    pub async fn delete_breed(&self, row: BreedId) -> AppResult<()> {
        self.state.read().ensure_row(row)?;
        self.repos.breeds.delete(row).await?;

        let mut state = self.state.write();
        state.reset_local(row);
        state.breeds.remove(&row);
        state.breed_tags.remove(&row);
        state.live.remove_row(row);
        state.saved.remove_row(row);
        audit_log!("delete", format!("breed:{}", row));
        Ok(())
    }

    /// Create a station and add it as a column
    pub async fn add_station(&self, data: StationCreate) -> AppResult<Station> {
        let station = self.repos.stations.create(data).await?;
        let mut state = self.state.write();
        state.stations.push(station.clone());
        state.sort_stations();
        audit_log!("create", format!("station:{}", station.id));
        Ok(station)
    }

    /// Delete a station with its rules, then drop its column
    pub async fn delete_station(&self, col: StationId) -> AppResult<()> {
        self.state.read().ensure_station(col)?;
        self.repos.stations.delete(col).await?;

        let mut state = self.state.write();
        state.stations.retain(|s| s.id != col);
        state.live.remove_column(col);
        state.saved.remove_column(col);
        audit_log!("delete", format!("station:{}", col));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: StationId, order: i32) -> Station {
        Station {
            id,
            name: format!("Station {}", id),
            is_active: true,
            display_order: order,
        }
    }

    fn breed(id: BreedId) -> Breed {
        Breed {
            id,
            name: format!("Breed {}", id),
            size_class: None,
            min_groom_price: None,
            max_groom_price: None,
            hourly_price: None,
            notes: None,
        }
    }

    fn state() -> EditorState {
        EditorState::from_snapshot(Snapshot {
            breeds: vec![breed(1), breed(2)],
            stations: vec![station(20, 2), station(10, 1)],
            rules: vec![
                StationBreedRule {
                    station_id: 10,
                    breed_id: 1,
                    is_active: true,
                    remote_booking_allowed: true,
                    requires_staff_approval: false,
                    duration_modifier_minutes: 45,
                },
                // Unknown station is dropped
                StationBreedRule::inactive(99, 1),
            ],
            tags: BTreeMap::new(),
            links: BTreeMap::from([(TagKind::Type, vec![TagLink { breed_id: 2, tag_id: 7 }])]),
        })
    }

    #[test]
    fn test_install() {
        let state = state();
        assert_eq!(state.station_ids(), vec![10, 20]);
        assert!(state.live.get(1, 10).supported);
        assert_eq!(state.live.cell(1, 99), None);
        assert_eq!(state.saved, state.live);
        assert_eq!(state.saved_tags(2, TagKind::Type), BTreeSet::from([7]));
        assert!(state.saved_tags(1, TagKind::Type).is_empty());
    }

    #[test]
    fn test_install_bumps_generations_and_drops_drafts() {
        let mut state = state();
        state.local_mut(1).draft = Some(BreedUpdate::default());
        state.local_mut(1).generation = 4;
        let untouched = state.generation(2);

        state.install(Snapshot {
            breeds: vec![breed(1), breed(2)],
            stations: vec![],
            rules: vec![],
            tags: BTreeMap::new(),
            links: BTreeMap::new(),
        });
        let local = &state.local[&1];
        assert_eq!(local.generation, 5);
        assert!(local.draft.is_none());
        // Rows without local state are invalidated too
        assert_eq!(state.generation(2), untouched + 1);
    }

    #[test]
    fn test_dirtiness_parts() {
        let mut state = state();
        assert_eq!(state.dirtiness(1), RowDirtiness::default());

        state.live.set_supported(1, 20, true);
        assert!(state.dirtiness(1).matrix);

        // A draft equal to the saved values is not dirty
        state.local_mut(2).draft = Some(BreedUpdate {
            name: Some("Breed 2".into()),
            ..Default::default()
        });
        assert!(!state.dirtiness(2).scalar);
        state.local_mut(2).draft = Some(BreedUpdate {
            notes: Some(Some("matted".into())),
            ..Default::default()
        });
        assert!(state.dirtiness(2).scalar);

        state.local_mut(2).tag_drafts.insert(TagKind::Type, BTreeSet::from([7]));
        assert!(!state.dirtiness(2).tags);
        state.local_mut(2).tag_drafts.insert(TagKind::Category, BTreeSet::from([1]));
        assert!(state.dirtiness(2).tags);
    }

    #[test]
    fn test_plan_row_save_validates_first() {
        let mut state = state();
        state.local_mut(1).draft = Some(BreedUpdate {
            name: Some("  ".into()),
            ..Default::default()
        });
        let err = MatrixEditor::plan_row_save(&state, 1).err().unwrap();
        assert_eq!(err.code, ErrorCode::BreedNameRequired);
    }

    #[test]
    fn test_plan_row_save_keeps_inactive_duration() {
        let mut state = state();
        state.live.set_supported(1, 10, false);
        let plan = MatrixEditor::plan_row_save(&state, 1).unwrap();
        assert_eq!(plan.rules.len(), 1);
        assert!(!plan.rules[0].is_active);
        assert_eq!(plan.rules[0].duration_modifier_minutes, 45);
    }
}
