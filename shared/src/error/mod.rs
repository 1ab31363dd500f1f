//! Unified error system for the grooming admin workspace
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Breed errors
//! - 3xxx: Station errors
//! - 4xxx: Matrix (station/breed rule) errors
//! - 5xxx: Duplication errors
//! - 6xxx: Appointment series errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCategory};
//!
//! let err = AppError::station_not_found(4);
//! assert_eq!(err.code.category(), ErrorCategory::Station);
//!
//! let err = AppError::validation("Minimum price exceeds maximum price")
//!     .with_detail("field", "min_groom_price");
//! assert!(err.is_validation());
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
