//! Client error types

use http::StatusCode;
use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("Backend error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Remote function returned an error
    #[error("Function {function} failed: {message}")]
    Function { function: String, message: String },

    /// Client misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a non-success status and body to an error
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation(body),
            StatusCode::CONFLICT => Self::Conflict(body),
            _ => Self::Api {
                status,
                message: body,
            },
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err {
            ClientError::Http(e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::TimeoutError, message)
            }
            ClientError::Http(_) => AppError::with_message(ErrorCode::NetworkError, message),
            ClientError::InvalidResponse(_) => AppError::database(message),
            ClientError::Unauthorized => AppError::new(ErrorCode::NotAuthenticated),
            ClientError::Forbidden(_) => {
                AppError::with_message(ErrorCode::PermissionDenied, message)
            }
            ClientError::NotFound(_) => AppError::with_message(ErrorCode::NotFound, message),
            ClientError::Validation(_) => AppError::invalid_request(message),
            ClientError::Conflict(_) => AppError::with_message(ErrorCode::AlreadyExists, message),
            ClientError::Api { status, .. } => {
                AppError::with_message(ErrorCode::from_http_status(status), message)
                    .with_detail("status", status.as_u16())
            }
            ClientError::Function { function, .. } => {
                AppError::with_message(ErrorCode::RemoteFunctionFailed, message)
                    .with_detail("function", function)
            }
            ClientError::Config(_) => AppError::config(message),
            ClientError::Serialization(_) => {
                AppError::with_message(ErrorCode::InvalidFormat, message)
            }
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, "dup".into()),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, "down".into()),
            ClientError::Api { .. }
        ));
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = ClientError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down".into()).into();
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert_eq!(err.details.unwrap()["status"], 503);

        let err: AppError = ClientError::Function {
            function: "send-templated-message".into(),
            message: "quota".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::RemoteFunctionFailed);
        assert_eq!(err.message, "Function send-templated-message failed: quota");

        let err: AppError = ClientError::Conflict("dup".into()).into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }
}
