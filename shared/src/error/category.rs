//! Error families, keyed by the thousands digit of the code

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the admin an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Breed,
    Station,
    /// Cell edits, row saves and bulk fills
    Matrix,
    Duplication,
    Series,
    /// Backend, network and configuration failures
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::General,
            1 => Self::Auth,
            2 => Self::Breed,
            3 => Self::Station,
            4 => Self::Matrix,
            5 => Self::Duplication,
            6 => Self::Series,
            _ => Self::System,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Breed => "breed",
            Self::Station => "station",
            Self::Matrix => "matrix",
            Self::Duplication => "duplication",
            Self::Series => "series",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
