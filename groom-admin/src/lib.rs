//! Groom Admin - breed/station matrix reconciliation engine
//!
//! Keeps an in-memory grid of breed × station capability cells in sync
//! with the remote rule table: per-row saves and reverts, optimistic
//! bulk edits with rollback, fan-out duplication and a filtered,
//! paginated view of the grid. Catalog repositories and the appointment
//! series workflow sit next to it.

pub mod bulk;
pub mod config;
pub mod dirty;
pub mod duplicate;
pub mod duration;
pub mod editor;
pub mod logger;
pub mod matrix;
pub mod repository;
pub mod series;
pub mod view;

pub use bulk::{BulkOutcome, BulkTransform};
pub use config::AdminConfig;
pub use dirty::{RowDirtiness, dirty_columns, is_row_dirty};
pub use duplicate::{DuplicateMode, DuplicateReport, DuplicateRequest, DuplicateSource};
pub use duration::{format_duration, parse_duration, resolve_duration};
pub use editor::{LocalEditState, MatrixEditor, SaveAllOutcome, SaveOutcome};
pub use matrix::{Cell, InactiveDuration, MatrixStore, Row, SupportStatus};
pub use series::SeriesService;
pub use view::{MatrixView, ViewFilter, ViewRow};
