use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::admission::{AdmissionServiceError, RepositoryError};
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
    Storage(RepositoryError),
    Admission(AdmissionServiceError),
    Worker(tokio::task::JoinError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid configuration: {}", err),
            AppError::Telemetry(err) => write!(f, "logging setup failed: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "http server error: {}", err),
            AppError::Storage(err) => write!(f, "admission store error: {}", err),
            AppError::Admission(err) => write!(f, "admission request failed: {}", err),
            AppError::Worker(err) => write!(f, "blocking worker failed: {}", err),
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
            AppError::Storage(err) => Some(err),
            AppError::Admission(err) => Some(err),
            AppError::Worker(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Storage(RepositoryError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "admission store unavailable")
            }
            AppError::Admission(AdmissionServiceError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "admission not found")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        };

        tracing::error!(error = %self, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
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

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<AdmissionServiceError> for AppError {
    fn from(value: AdmissionServiceError) -> Self {
        match value {
            AdmissionServiceError::Repository(err) => Self::Storage(err),
            other => Self::Admission(other),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Worker(value)
    }
}
