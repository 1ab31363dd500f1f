//! Numeric error codes
//!
//! The thousands digit names the family (see [`super::ErrorCategory`]):
//! 0 general, 1 auth, 2 breed, 3 station, 4 matrix, 5 duplication,
//! 6 appointment series, 9 system.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable error code shown to the operator
///
/// Serialized as its bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // 0xxx
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    InvalidRequest = 5,
    /// Backend returned a payload we could not decode
    InvalidFormat = 6,

    // 1xxx
    NotAuthenticated = 1001,
    /// Backend refused the call, usually row level security
    PermissionDenied = 1002,

    // 2xxx
    BreedNotFound = 2001,
    BreedNameRequired = 2002,
    BreedInvalidPrice = 2003,
    /// Minimum groom price above maximum
    BreedPriceRange = 2004,
    TagNotFound = 2101,

    // 3xxx
    StationNotFound = 3001,
    StationNameRequired = 3002,

    // 4xxx
    RowNotLoaded = 4001,
    /// A save for this row is already in flight
    RowBusy = 4002,
    InvalidDuration = 4003,

    // 5xxx
    DuplicateNoTargets = 5001,
    /// Some targets were written, others were not
    DuplicatePartialFailure = 5002,
    DuplicateTargetIsSource = 5003,

    // 6xxx
    SeriesNotFound = 6001,
    SeriesInvalidRequest = 6002,
    SeriesMessageFailed = 6003,

    // 9xxx
    InternalError = 9001,
    DatabaseError = 9002,
    NetworkError = 9003,
    TimeoutError = 9004,
    ConfigError = 9005,
    RemoteFunctionFailed = 9006,
}

impl ErrorCode {
    /// Every code, in numeric order
    pub const ALL: [ErrorCode; 30] = [
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::InvalidFormat,
        ErrorCode::NotAuthenticated,
        ErrorCode::PermissionDenied,
        ErrorCode::BreedNotFound,
        ErrorCode::BreedNameRequired,
        ErrorCode::BreedInvalidPrice,
        ErrorCode::BreedPriceRange,
        ErrorCode::TagNotFound,
        ErrorCode::StationNotFound,
        ErrorCode::StationNameRequired,
        ErrorCode::RowNotLoaded,
        ErrorCode::RowBusy,
        ErrorCode::InvalidDuration,
        ErrorCode::DuplicateNoTargets,
        ErrorCode::DuplicatePartialFailure,
        ErrorCode::DuplicateTargetIsSource,
        ErrorCode::SeriesNotFound,
        ErrorCode::SeriesInvalidRequest,
        ErrorCode::SeriesMessageFailed,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::NetworkError,
        ErrorCode::TimeoutError,
        ErrorCode::ConfigError,
        ErrorCode::RemoteFunctionFailed,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether this code is raised by local input checks, before any
    /// call reaches the backend
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidRequest
                | ErrorCode::BreedNameRequired
                | ErrorCode::BreedInvalidPrice
                | ErrorCode::BreedPriceRange
                | ErrorCode::StationNameRequired
                | ErrorCode::InvalidDuration
                | ErrorCode::DuplicateNoTargets
                | ErrorCode::DuplicateTargetIsSource
                | ErrorCode::SeriesInvalidRequest
        )
    }

    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Unexpected response format",

            ErrorCode::NotAuthenticated => "Not authenticated against the backend",
            ErrorCode::PermissionDenied => "Permission denied",

            ErrorCode::BreedNotFound => "Breed not found",
            ErrorCode::BreedNameRequired => "Breed name is required",
            ErrorCode::BreedInvalidPrice => "Prices must not be negative",
            ErrorCode::BreedPriceRange => "Minimum price must not exceed maximum price",
            ErrorCode::TagNotFound => "Tag not found",

            ErrorCode::StationNotFound => "Station not found",
            ErrorCode::StationNameRequired => "Station name is required",

            ErrorCode::RowNotLoaded => "Row is not loaded",
            ErrorCode::RowBusy => "Row is already being saved",
            ErrorCode::InvalidDuration => "Duration must be written as H:MM",

            ErrorCode::DuplicateNoTargets => "No duplication targets selected",
            ErrorCode::DuplicatePartialFailure => "Some duplication targets failed",
            ErrorCode::DuplicateTargetIsSource => "Cannot duplicate onto the source itself",

            ErrorCode::SeriesNotFound => "Appointment series not found",
            ErrorCode::SeriesInvalidRequest => "Invalid series duplication request",
            ErrorCode::SeriesMessageFailed => "Failed to send templated message",

            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Request timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::RemoteFunctionFailed => "Remote function failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A number that does not name any [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown error code {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_sorted_and_complete() {
        let numbers: Vec<u16> = ErrorCode::ALL.iter().map(|c| c.code()).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
            assert!(!code.message().is_empty());
        }
    }

    #[test]
    fn test_unknown_number_rejected() {
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(4004), Err(InvalidErrorCode(4004)));
        assert_eq!(InvalidErrorCode(7777).to_string(), "unknown error code 7777");
    }

    #[test]
    fn test_wire_form_is_a_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::BreedPriceRange).unwrap(), "2004");
        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::RowNotLoaded);
        assert!(serde_json::from_str::<ErrorCode>("4004").is_err());
        assert_eq!(ErrorCode::InvalidRequest.to_string(), "E0005");
    }
}
