//! Appointment series duplication through the backend's remote functions

use crate::audit_log;
use groom_client::Persistence;
use serde_json::{Value, json};
use shared::models::{SeriesDuplicateOutcome, SeriesDuplicateRequest, SeriesDuplicateResult, SeriesMessage};
use shared::{AppError, AppResult, ErrorCode};
use std::sync::Arc;

pub const DUPLICATE_SERIES_FUNCTION: &str = "duplicate-appointment-series";
pub const SEND_MESSAGE_FUNCTION: &str = "send-templated-message";

#[derive(Clone)]
pub struct SeriesService {
    db: Arc<dyn Persistence>,
}

impl SeriesService {
    pub fn new(db: Arc<dyn Persistence>) -> Self {
        Self { db }
    }

    /// Copy a series, then send the optional message
    ///
    /// A failed message never undoes the copy; it comes back as
    /// `message_warning`.
    pub async fn duplicate_series(
        &self,
        request: SeriesDuplicateRequest,
    ) -> AppResult<SeriesDuplicateOutcome> {
        request.check()?;

        let payload = serde_json::to_value(&request)
            .map_err(|e| AppError::internal(format!("Failed to encode series request: {}", e)))?;
        let response = self
            .db
            .invoke(DUPLICATE_SERIES_FUNCTION, payload)
            .await
            .map_err(|e| {
                let err: AppError = e.into();
                if err.code == ErrorCode::NotFound {
                    AppError::new(ErrorCode::SeriesNotFound).with_detail("series_id", request.series_id)
                } else {
                    err
                }
            })?;
        let result: SeriesDuplicateResult = serde_json::from_value(response).map_err(|e| {
            AppError::with_message(
                ErrorCode::InvalidFormat,
                format!("Unexpected series duplication response: {}", e),
            )
        })?;
        tracing::info!(
            source_series = request.series_id,
            series_id = result.series_id,
            appointments = result.appointment_ids.len(),
            "Appointment series duplicated"
        );
        audit_log!(
            "duplicate_series",
            format!("series:{}", request.series_id),
            format!("new_series={}", result.series_id)
        );

        let mut outcome = SeriesDuplicateOutcome {
            result,
            message_sent: false,
            message_warning: None,
        };
        if let Some(message) = &request.message {
            match self.send_message(message, &outcome.result).await {
                Ok(()) => outcome.message_sent = true,
                Err(e) => {
                    tracing::warn!(
                        series_id = outcome.result.series_id,
                        category = %e.code.category(),
                        error = %e,
                        "Series copied but the message was not sent"
                    );
                    outcome.message_warning = Some(e.message);
                }
            }
        }
        Ok(outcome)
    }

    async fn send_message(&self, message: &SeriesMessage, result: &SeriesDuplicateResult) -> AppResult<()> {
        let mut variables = message.variables.clone();
        variables.insert("series_id".into(), json!(result.series_id));
        variables.insert("appointment_ids".into(), json!(result.appointment_ids));

        let payload = json!({
            "template_id": message.template_id,
            "recipient": message.recipient,
            "variables": Value::Object(variables),
        });
        self.db.invoke(SEND_MESSAGE_FUNCTION, payload).await.map_err(|e| {
            let err: AppError = e.into();
            AppError::with_message(ErrorCode::SeriesMessageFailed, err.message)
        })?;
        Ok(())
    }
}
