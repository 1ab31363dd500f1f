//! Station Model

use super::StationId;
use crate::error::{AppError, AppResult, ErrorCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Station (grooming bay) entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub is_active: bool,
    pub display_order: i32,
}

/// Create station payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationCreate {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Appended after the last station when not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

fn default_true() -> bool {
    true
}

impl StationCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
            display_order: None,
        }
    }

    pub fn check(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::new(ErrorCode::StationNameRequired).with_detail("field", "name"));
        }
        self.validate()?;
        Ok(())
    }
}

/// Update station payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl StationUpdate {
    pub fn check(&self) -> AppResult<()> {
        match &self.name {
            Some(name) if name.trim().is_empty() => {
                Err(AppError::new(ErrorCode::StationNameRequired).with_detail("field", "name"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_check() {
        assert!(StationCreate::new("Tub 1").check().is_ok());
        assert_eq!(
            StationCreate::new(" ").check().unwrap_err().code,
            ErrorCode::StationNameRequired
        );
        assert_eq!(
            StationCreate::new("x".repeat(81)).check().unwrap_err().code,
            ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_create_omits_missing_display_order() {
        let json = serde_json::to_value(StationCreate::new("Table A")).unwrap();
        assert!(json.get("display_order").is_none());
        assert_eq!(json["is_active"], true);
    }

    #[test]
    fn test_update_check() {
        let update = StationUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update.check().is_err());
        assert!(StationUpdate::default().check().is_ok());
    }
}
