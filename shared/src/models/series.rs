//! Appointment Series Duplication DTOs
//!
//! Payloads for the `duplicate-appointment-series` and
//! `send-templated-message` remote functions.

use crate::error::{AppError, AppResult, ErrorCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Request to copy an appointment series to a new start date
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeriesDuplicateRequest {
    pub series_id: i64,
    pub start_date: NaiveDate,
    /// Number of occurrences to create; the server copies all when absent
    #[validate(range(min = 1, max = 104))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
    #[serde(default)]
    pub copy_notes: bool,
    /// Optional notification sent after the copy succeeds
    #[validate(nested)]
    #[serde(skip_serializing)]
    pub message: Option<SeriesMessage>,
}

impl SeriesDuplicateRequest {
    pub fn new(series_id: i64, start_date: NaiveDate) -> Self {
        Self {
            series_id,
            start_date,
            occurrences: None,
            copy_notes: false,
            message: None,
        }
    }

    pub fn with_message(mut self, message: SeriesMessage) -> Self {
        self.message = Some(message);
        self
    }

    /// Run every local check, mapping failures onto the series error code
    pub fn check(&self) -> AppResult<()> {
        if self.series_id <= 0 {
            return Err(AppError::new(ErrorCode::SeriesInvalidRequest)
                .with_detail("field", "series_id"));
        }
        self.validate().map_err(|e| {
            let err: AppError = e.into();
            AppError {
                code: ErrorCode::SeriesInvalidRequest,
                ..err
            }
        })
    }
}

/// Templated message sent through the messaging function
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeriesMessage {
    #[validate(length(min = 1))]
    pub template_id: String,
    #[validate(length(min = 1))]
    pub recipient: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

/// Response of `duplicate-appointment-series`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDuplicateResult {
    pub series_id: i64,
    #[serde(default)]
    pub appointment_ids: Vec<i64>,
}

/// Duplication result plus the state of the best-effort message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDuplicateOutcome {
    pub result: SeriesDuplicateResult,
    pub message_sent: bool,
    /// Set when the copy succeeded but the message did not go out
    pub message_warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_check_accepts_minimal_request() {
        assert!(SeriesDuplicateRequest::new(4, date()).check().is_ok());
    }

    #[test]
    fn test_check_rejects_bad_fields() {
        let err = SeriesDuplicateRequest::new(0, date()).check().unwrap_err();
        assert_eq!(err.code, ErrorCode::SeriesInvalidRequest);

        let mut req = SeriesDuplicateRequest::new(4, date());
        req.occurrences = Some(0);
        assert_eq!(req.check().unwrap_err().code, ErrorCode::SeriesInvalidRequest);

        let req = SeriesDuplicateRequest::new(4, date()).with_message(SeriesMessage {
            template_id: String::new(),
            recipient: "owner@example.com".into(),
            variables: Map::new(),
        });
        let err = req.check().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_message_is_not_sent_to_duplicate_function() {
        let req = SeriesDuplicateRequest::new(4, date()).with_message(SeriesMessage {
            template_id: "series-copied".into(),
            recipient: "owner@example.com".into(),
            variables: Map::new(),
        });
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["start_date"], "2026-03-02");
    }
}
