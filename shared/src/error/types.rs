//! Application error type

use super::codes::ErrorCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error surfaced by every engine operation
///
/// `details` carries machine-readable context such as the offending field,
/// the breed or station id, or the failed duplication targets.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach one detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    /// Raised before any network call was made
    pub fn is_validation(&self) -> bool {
        self.code.is_validation()
    }

    // ========== Domain constructors ==========

    pub fn breed_not_found(id: i64) -> Self {
        Self::with_message(ErrorCode::BreedNotFound, format!("Breed {} not found", id))
            .with_detail("breed_id", id)
    }

    pub fn station_not_found(id: i64) -> Self {
        Self::with_message(ErrorCode::StationNotFound, format!("Station {} not found", id))
            .with_detail("station_id", id)
    }

    /// The breed has no row in the loaded matrix
    pub fn row_not_loaded(id: i64) -> Self {
        Self::with_message(ErrorCode::RowNotLoaded, format!("Breed {} is not loaded", id))
            .with_detail("breed_id", id)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// The backend answered but the data was unusable
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        Self::with_message(ErrorCode::ValidationFailed, errors.to_string())
            .with_detail("fields", fields)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::RowBusy);
        assert_eq!(err.message, "Row is already being saved");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "Row is already being saved");
    }

    #[test]
    fn test_domain_constructors() {
        let err = AppError::breed_not_found(7);
        assert_eq!(err.code, ErrorCode::BreedNotFound);
        assert_eq!(err.message, "Breed 7 not found");
        assert_eq!(err.detail("breed_id"), Some(&Value::from(7)));

        let err = AppError::station_not_found(3);
        assert_eq!(err.code, ErrorCode::StationNotFound);
        assert_eq!(err.detail("station_id"), Some(&Value::from(3)));

        let err = AppError::row_not_loaded(9);
        assert_eq!(err.code, ErrorCode::RowNotLoaded);
        assert_eq!(err.to_string(), "Breed 9 is not loaded");
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::new(ErrorCode::DuplicatePartialFailure)
            .with_detail("failed_targets", vec![2, 5])
            .with_detail("succeeded_targets", vec![3]);
        assert_eq!(err.detail("failed_targets").unwrap(), &serde_json::json!([2, 5]));
        assert_eq!(err.detail("succeeded_targets").unwrap(), &serde_json::json!([3]));
        assert!(err.detail("errors").is_none());
    }

    #[test]
    fn test_is_validation() {
        assert!(AppError::validation("bad").is_validation());
        assert!(AppError::new(ErrorCode::BreedPriceRange).is_validation());
        assert!(!AppError::breed_not_found(1).is_validation());
        assert!(!AppError::database("down").is_validation());
        assert!(!AppError::new(ErrorCode::RowBusy).is_validation());
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::Validate;

        #[derive(Validate)]
        struct Payload {
            #[validate(length(min = 1))]
            name: String,
        }

        let err: AppError = Payload { name: String::new() }.validate().unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.detail("fields").unwrap(), &serde_json::json!(["name"]));
    }
}
