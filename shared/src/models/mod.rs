//! Data models
//!
//! Row types mirror the backend tables one to one. Payload types
//! (`*Create`, `*Update`) are what the admin sends back.
//! All IDs are `i64` (integer primary keys).

pub mod breed;
pub mod rule;
pub mod series;
pub mod station;
pub mod tag;

/// Breed primary key
pub type BreedId = i64;
/// Station primary key
pub type StationId = i64;
/// Category/type tag primary key
pub type TagId = i64;

// Re-exports
pub use breed::*;
pub use rule::*;
pub use series::*;
pub use station::*;
pub use tag::*;
