use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::resume::export::ExportError;
use crate::resume::session::SessionError;
use crate::resume::store::save_failure_message;

pub const ONBOARDING_PATH: &str = "/onboarding";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// The JSON body doubles as the client's error notification.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Onboarding required")]
    OnboardingRequired,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Save failed: {}", save_failure_message(.0))]
    SaveFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::OnboardingRequired => (
                StatusCode::FORBIDDEN,
                "ONBOARDING_REQUIRED",
                "Complete your profile to continue".to_string(),
            ),
            AppError::Session(e) => {
                let code = match e {
                    SessionError::AcknowledgementRequired => "ACKNOWLEDGEMENT_REQUIRED",
                    SessionError::Busy(_) => "IN_PROGRESS",
                    SessionError::NotInPreview
                    | SessionError::NotEditable
                    | SessionError::NotOpen => "INVALID_STATE",
                };
                (StatusCode::CONFLICT, code, e.to_string())
            }
            AppError::Export(ExportError::MissingTarget) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXPORT_TARGET_MISSING",
                ExportError::MissingTarget.to_string(),
            ),
            AppError::Export(e @ ExportError::Conversion(_)) => {
                tracing::error!("PDF generation error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EXPORT_FAILED",
                    "Failed to generate PDF".to_string(),
                )
            }
            AppError::SaveFailed(msg) => {
                let message = save_failure_message(msg).to_string();
                tracing::error!("Save error: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, "SAVE_FAILED", message)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        if matches!(self, AppError::OnboardingRequired) {
            body["redirect"] = json!(ONBOARDING_PATH);
        }

        (status, Json(body)).into_response()
    }
}
