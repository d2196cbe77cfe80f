use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{AdmissionId, AdmissionSubmission};
use super::repository::{AdmissionRepository, ListingCache};
use super::service::{AdmissionService, AdmissionServiceError, SubmissionOutcome};
use crate::error::AppError;

/// Router exposing intake plus the admin list and detail reads.
pub fn admission_router<R, C>(service: Arc<AdmissionService<R, C>>) -> Router
where
    R: AdmissionRepository + 'static,
    C: ListingCache + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions",
            get(list_handler::<R, C>).post(submit_handler::<R, C>),
        )
        .route(
            "/api/v1/admissions/:admission_id",
            get(detail_handler::<R, C>),
        )
        .with_state(service)
}

/// Store calls hold a connection lock and do file I/O, so they run on the
/// blocking pool instead of an async worker.
async fn run_blocking<R, C, T, F>(
    service: Arc<AdmissionService<R, C>>,
    work: F,
) -> Result<T, AppError>
where
    R: AdmissionRepository + 'static,
    C: ListingCache + 'static,
    T: Send + 'static,
    F: FnOnce(&AdmissionService<R, C>) -> T + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || work(&service)).await?)
}

pub(crate) async fn submit_handler<R, C>(
    State(service): State<Arc<AdmissionService<R, C>>>,
    Json(submission): Json<AdmissionSubmission>,
) -> Response
where
    R: AdmissionRepository + 'static,
    C: ListingCache + 'static,
{
    let result = match run_blocking(service, move |service| service.submit(submission)).await {
        Ok(result) => result,
        Err(err) => {
            error!(error = %err, "admission submission aborted");
            let outcome = SubmissionOutcome::rejected();
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(outcome)).into_response();
        }
    };
    let status = match &result {
        Ok(_) => StatusCode::CREATED,
        Err(AdmissionServiceError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(SubmissionOutcome::from_result(&result))).into_response()
}

pub(crate) async fn list_handler<R, C>(
    State(service): State<Arc<AdmissionService<R, C>>>,
) -> Response
where
    R: AdmissionRepository + 'static,
    C: ListingCache + 'static,
{
    match run_blocking(service, |service| service.list()).await {
        Ok(Ok(view)) => (StatusCode::OK, Json(view)).into_response(),
        Ok(Err(err)) => AppError::from(err).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler<R, C>(
    State(service): State<Arc<AdmissionService<R, C>>>,
    Path(admission_id): Path<String>,
) -> Response
where
    R: AdmissionRepository + 'static,
    C: ListingCache + 'static,
{
    let admission_id = AdmissionId(admission_id);
    match run_blocking(service, move |service| service.detail(&admission_id)).await {
        Ok(Ok(view)) => (StatusCode::OK, Json(view)).into_response(),
        Ok(Err(AdmissionServiceError::NotFound(id))) => {
            let payload = json!({
                "admission_id": id,
                "error": "admission not found",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Ok(Err(err)) => AppError::from(err).into_response(),
        Err(err) => err.into_response(),
    }
}
