//! Shared types for the grooming admin workspace
//!
//! Common types used across the client and admin crates: data models,
//! the unified error system and pagination structures.

pub mod error;
pub mod models;
pub mod pagination;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use pagination::PaginatedResponse;
