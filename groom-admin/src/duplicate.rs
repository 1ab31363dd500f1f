//! Duplication - copy a breed row or a station column onto new or existing targets
//!
//! Each target receives one batched rule upsert, so a target is either
//! fully updated or left alone. Targets run concurrently and a failing
//! target does not undo the others.

use crate::audit_log;
use crate::duration::{DEFAULT_MINUTES, MAX_MINUTES};
use crate::editor::{EditorState, MatrixEditor};
use crate::matrix::Cell;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::models::{BreedCreate, BreedId, BreedUpdate, StationBreedRule, StationCreate, StationId, StationUpdate};
use shared::{AppError, AppResult, ErrorCode};
use std::collections::BTreeSet;

/// What is being copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DuplicateSource {
    /// A breed row, copied onto other breeds
    Breed(BreedId),
    /// A station column, copied onto other stations
    Station(StationId),
}

impl DuplicateSource {
    pub fn id(&self) -> i64 {
        match *self {
            DuplicateSource::Breed(id) | DuplicateSource::Station(id) => id,
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            DuplicateSource::Breed(_) => "breed",
            DuplicateSource::Station(_) => "station",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DuplicateMode {
    /// Create one new entity; scalar fields are always copied
    New { name: String },
    /// Copy onto already existing entities
    Existing { targets: Vec<i64> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRequest {
    pub source: DuplicateSource,
    pub mode: DuplicateMode,
    /// Only consulted for `Existing`
    pub copy_scalar: bool,
    pub copy_relations: bool,
    /// Added to the row default for cells without an explicit time
    pub base_minutes: u32,
}

impl DuplicateRequest {
    /// Copy into a newly created entity
    pub fn new_copy(source: DuplicateSource, name: impl Into<String>) -> Self {
        Self {
            source,
            mode: DuplicateMode::New { name: name.into() },
            copy_scalar: true,
            copy_relations: true,
            base_minutes: 0,
        }
    }

    /// Copy onto existing entities
    pub fn onto(source: DuplicateSource, targets: impl IntoIterator<Item = i64>) -> Self {
        Self {
            source,
            mode: DuplicateMode::Existing {
                targets: targets.into_iter().collect(),
            },
            copy_scalar: false,
            copy_relations: true,
            base_minutes: 0,
        }
    }

    pub fn with_scalar(mut self, copy_scalar: bool) -> Self {
        self.copy_scalar = copy_scalar;
        self
    }

    pub fn with_relations(mut self, copy_relations: bool) -> Self {
        self.copy_relations = copy_relations;
        self
    }

    pub fn with_base_minutes(mut self, base_minutes: u32) -> Self {
        self.base_minutes = base_minutes;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    /// Id of the entity created in `New` mode
    pub created: Option<i64>,
    /// Existing targets that were updated
    pub updated: Vec<i64>,
    pub rules_written: usize,
}

/// Supported source cell replayed onto a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CopiedCell {
    /// The other axis: station for a breed source, breed for a station source
    other: i64,
    minutes: u32,
    remote: bool,
    approval: bool,
}

impl CopiedCell {
    fn rule(&self, source: DuplicateSource, target: i64) -> StationBreedRule {
        let (station_id, breed_id) = match source {
            DuplicateSource::Breed(_) => (self.other, target),
            DuplicateSource::Station(_) => (target, self.other),
        };
        StationBreedRule {
            station_id,
            breed_id,
            is_active: true,
            remote_booking_allowed: self.remote,
            requires_staff_approval: self.approval,
            duration_modifier_minutes: i32::try_from(self.minutes).unwrap_or(i32::MAX),
        }
    }

    fn cell(&self, default_time: u32) -> Cell {
        Cell {
            supported: true,
            default_time: Some(default_time),
            station_time: Some(self.minutes),
            remote_allowed: Some(self.remote),
            approval_needed: Some(self.approval),
        }
    }
}

/// Duration written for a copied cell
fn copied_minutes(cell: &Cell, base_minutes: u32) -> u32 {
    cell.station_time
        .unwrap_or_else(|| base_minutes.saturating_add(cell.default_time.unwrap_or(DEFAULT_MINUTES)))
        .min(MAX_MINUTES)
}

/// Scalar payloads captured from the source before any call
enum ScalarCopy {
    Breed {
        create: BreedCreate,
        /// Every scalar column except the name
        update: BreedUpdate,
    },
    Station(StationCreate),
}

/// Everything read from the editor state up front
struct DuplicatePlan {
    cells: Vec<CopiedCell>,
    scalar: ScalarCopy,
}

/// Outcome of one target
struct TargetResult {
    target: i64,
    created: bool,
    rules: Vec<StationBreedRule>,
}

impl DuplicatePlan {
    fn capture(state: &EditorState, request: &DuplicateRequest) -> AppResult<Self> {
        let source = request.source;
        let cells: Vec<CopiedCell> = match source {
            DuplicateSource::Breed(row) => {
                state.ensure_row(row)?;
                state
                    .live
                    .clone_row(row)
                    .into_iter()
                    .filter(|(col, cell)| cell.supported && state.ensure_station(*col).is_ok())
                    .map(|(col, cell)| CopiedCell {
                        other: col,
                        minutes: copied_minutes(&cell, request.base_minutes),
                        remote: cell.remote(),
                        approval: cell.approval(),
                    })
                    .collect()
            }
            DuplicateSource::Station(col) => {
                state.ensure_station(col)?;
                state
                    .breeds
                    .keys()
                    .filter_map(|row| state.live.cell(*row, col).map(|cell| (*row, cell)))
                    .filter(|(_, cell)| cell.supported)
                    .map(|(row, cell)| CopiedCell {
                        other: row,
                        minutes: copied_minutes(cell, request.base_minutes),
                        remote: cell.remote(),
                        approval: cell.approval(),
                    })
                    .collect()
            }
        };

        let name = match &request.mode {
            DuplicateMode::New { name } => name.clone(),
            DuplicateMode::Existing { .. } => String::new(),
        };
        let scalar = match source {
            DuplicateSource::Breed(row) => {
                let breed = state
                    .breeds
                    .get(&row)
                    .ok_or_else(|| AppError::row_not_loaded(row))?;
                let mut update = breed.to_full_update();
                update.name = None;
                ScalarCopy::Breed {
                    create: breed.to_create(name),
                    update,
                }
            }
            DuplicateSource::Station(col) => {
                let station = state
                    .stations
                    .iter()
                    .find(|s| s.id == col)
                    .ok_or_else(|| AppError::station_not_found(col))?;
                ScalarCopy::Station(StationCreate {
                    name,
                    is_active: station.is_active,
                    display_order: None,
                })
            }
        };

        Ok(Self { cells, scalar })
    }

    fn rules(&self, source: DuplicateSource, target: i64) -> Vec<StationBreedRule> {
        self.cells.iter().map(|c| c.rule(source, target)).collect()
    }
}

/// Reject bad requests before anything is sent
fn validate(state: &EditorState, request: &DuplicateRequest) -> AppResult<Vec<i64>> {
    let source = request.source;
    match &request.mode {
        DuplicateMode::New { name } => {
            match source {
                DuplicateSource::Breed(_) => BreedCreate::new(name.clone()).check()?,
                DuplicateSource::Station(_) => StationCreate::new(name.clone()).check()?,
            }
            Ok(Vec::new())
        }
        DuplicateMode::Existing { targets } => {
            let targets: Vec<i64> = targets
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            if targets.is_empty() {
                return Err(AppError::new(ErrorCode::DuplicateNoTargets));
            }
            if targets.contains(&source.id()) {
                return Err(AppError::new(ErrorCode::DuplicateTargetIsSource)
                    .with_detail("target", source.id()));
            }
            for target in &targets {
                match source {
                    DuplicateSource::Breed(_) => state.ensure_row(*target)?,
                    DuplicateSource::Station(_) => state.ensure_station(*target)?,
                }
            }
            Ok(targets)
        }
    }
}

impl MatrixEditor {
    /// Copy a breed row or station column onto a new entity or existing ones
    ///
    /// Source values are read from the live grid. When some targets fail
    /// the rest stay applied and a `DuplicatePartialFailure` error lists
    /// both sets.
    pub async fn duplicate(&self, request: DuplicateRequest) -> AppResult<DuplicateReport> {
        let (targets, plan) = {
            let state = self.state.read();
            let targets = validate(&state, &request)?;
            let plan = DuplicatePlan::capture(&state, &request)?;
            (targets, plan)
        };
        let source = request.source;

        let results: Vec<(i64, AppResult<TargetResult>)> = match &request.mode {
            DuplicateMode::New { .. } => vec![(0, self.duplicate_into_new(&request, &plan).await)],
            DuplicateMode::Existing { .. } => {
                let (request, plan) = (&request, &plan);
                let futures = targets.iter().map(|target| {
                    let target = *target;
                    async move { (target, self.duplicate_onto(&request, &plan, target).await) }
                });
                join_all(futures).await
            }
        };

        let mut report = DuplicateReport::default();
        let mut failed = Vec::new();
        let mut errors = Vec::new();
        for (target, result) in results {
            match result {
                Ok(done) => {
                    report.rules_written += done.rules.len();
                    if done.created {
                        report.created = Some(done.target);
                    } else {
                        report.updated.push(done.target);
                    }
                    self.install_copied(source, done.target, &plan, &done.rules);
                }
                Err(e) => {
                    tracing::error!(
                        source = source.entity(),
                        source_id = source.id(),
                        target,
                        category = %e.code.category(),
                        error = %e,
                        "Duplication target failed"
                    );
                    errors.push(json!({
                        "target": target,
                        "code": e.code.code(),
                        "category": e.code.category(),
                        "message": e.message.clone(),
                    }));
                    failed.push(target);
                    if let DuplicateMode::New { .. } = request.mode {
                        return Err(e);
                    }
                }
            }
        }

        audit_log!(
            "duplicate",
            format!("{}:{}", source.entity(), source.id()),
            format!(
                "created={:?} updated={:?} failed={:?}",
                report.created, report.updated, failed
            )
        );

        if failed.is_empty() {
            Ok(report)
        } else {
            Err(AppError::with_message(
                ErrorCode::DuplicatePartialFailure,
                format!("{} of {} targets failed", failed.len(), failed.len() + report.updated.len()),
            )
            .with_detail("failed_targets", failed)
            .with_detail("succeeded_targets", report.updated)
            .with_detail("errors", errors))
        }
    }

    async fn duplicate_into_new(
        &self,
        request: &DuplicateRequest,
        plan: &DuplicatePlan,
    ) -> AppResult<TargetResult> {
        let source = request.source;
        let target = match &plan.scalar {
            ScalarCopy::Breed { create, .. } => {
                let breed = self.repos.breeds.create(create.clone()).await?;
                let id = breed.id;
                let mut state = self.state.write();
                state.live.ensure_row(id);
                state.saved.ensure_row(id);
                state.breeds.insert(id, breed);
                id
            }
            ScalarCopy::Station(data) => {
                let station = self.repos.stations.create(data.clone()).await?;
                let id = station.id;
                let mut state = self.state.write();
                state.stations.push(station);
                state.sort_stations();
                id
            }
        };

        let rules = if request.copy_relations {
            plan.rules(source, target)
        } else {
            Vec::new()
        };
        self.repos
            .rules
            .upsert(&rules)
            .await
            .map_err(|e| e.with_detail("created", target))?;
        Ok(TargetResult {
            target,
            created: true,
            rules,
        })
    }

    async fn duplicate_onto(
        &self,
        request: &DuplicateRequest,
        plan: &DuplicatePlan,
        target: i64,
    ) -> AppResult<TargetResult> {
        let source = request.source;
        if request.copy_scalar {
            match &plan.scalar {
                ScalarCopy::Breed { update, .. } => {
                    let breed = self.repos.breeds.update(target, update.clone()).await?;
                    self.state.write().breeds.insert(target, breed);
                }
                ScalarCopy::Station(data) => {
                    let update = StationUpdate {
                        is_active: Some(data.is_active),
                        ..Default::default()
                    };
                    let station = self.repos.stations.update(target, update).await?;
                    let mut state = self.state.write();
                    if let Some(slot) = state.stations.iter_mut().find(|s| s.id == target) {
                        *slot = station;
                    }
                }
            }
        }

        let rules = if request.copy_relations {
            plan.rules(source, target)
        } else {
            Vec::new()
        };
        self.repos.rules.upsert(&rules).await?;
        Ok(TargetResult {
            target,
            created: false,
            rules,
        })
    }

    /// Fold persisted copies into both grids
    fn install_copied(
        &self,
        source: DuplicateSource,
        target: i64,
        plan: &DuplicatePlan,
        rules: &[StationBreedRule],
    ) {
        if rules.is_empty() {
            return;
        }
        let mut state = self.state.write();
        for copied in &plan.cells {
            let (row, col) = match source {
                DuplicateSource::Breed(_) => (target, copied.other),
                DuplicateSource::Station(_) => (copied.other, target),
            };
            if !state.breeds.contains_key(&row) {
                continue;
            }
            let default_time = state.saved.derived_default(row);
            let cell = copied.cell(default_time);
            state.saved.put_cell(row, col, Some(cell.clone()));
            state.live.put_cell(row, col, Some(cell));
        }
    }
}
