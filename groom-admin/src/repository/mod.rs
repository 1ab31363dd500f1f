//! Repository Module
//!
//! CRUD access to the catalog tables through a [`Persistence`] backend.

pub mod breed;
pub mod rule;
pub mod station;
pub mod tag;

// Re-exports
pub use breed::BreedRepository;
pub use rule::RuleRepository;
pub use station::StationRepository;
pub use tag::TagRepository;

use groom_client::Persistence;
use std::sync::Arc;

/// Table names
pub mod tables {
    pub const BREEDS: &str = "breeds";
    pub const STATIONS: &str = "stations";
    pub const RULES: &str = "station_breed_rules";
}

/// Shared handle to the persistence backend
#[derive(Clone)]
pub struct BaseRepository {
    db: Arc<dyn Persistence>,
}

impl BaseRepository {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &dyn Persistence {
        self.db.as_ref()
    }
}

/// All repositories over one backend
#[derive(Clone)]
pub struct Repositories {
    pub breeds: BreedRepository,
    pub stations: StationRepository,
    pub rules: RuleRepository,
    pub tags: TagRepository,
}

impl Repositories {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self {
            breeds: BreedRepository::new(db.clone()),
            stations: StationRepository::new(db.clone()),
            rules: RuleRepository::new(db.clone()),
            tags: TagRepository::new(db),
        }
    }
}
