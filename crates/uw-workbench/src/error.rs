use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::underwriting::edits::EditError;
use crate::workflows::underwriting::WorkbenchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Csv(csv::Error),
    Workbench(WorkbenchError),
    StateUnavailable,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Workbench(err) => match err {
                WorkbenchError::SubmissionNotFound(_) | WorkbenchError::UnderwriterNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                WorkbenchError::NotPermitted { .. } => StatusCode::FORBIDDEN,
                WorkbenchError::DuplicateSubmission(_) => StatusCode::CONFLICT,
                WorkbenchError::Edit(EditError::FieldNotFound(_))
                | WorkbenchError::Edit(EditError::InvalidPath(_))
                | WorkbenchError::Edit(EditError::InvalidFieldValue { .. })
                | WorkbenchError::UnassignedSubmission(_)
                | WorkbenchError::InconsistentSubmission { .. }
                | WorkbenchError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Csv(_)
            | AppError::StateUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Csv(err) => write!(f, "csv export error: {}", err),
            AppError::Workbench(err) => write!(f, "{}", err),
            AppError::StateUnavailable => write!(f, "workbench state is unavailable"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Csv(err) => Some(err),
            AppError::Workbench(err) => Some(err),
            AppError::StateUnavailable => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<WorkbenchError> for AppError {
    fn from(value: WorkbenchError) -> Self {
        Self::Workbench(value)
    }
}
