use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use super::domain::{AdmissionId, AdmissionSubmission};
use super::repository::{AdmissionRecord, AdmissionRepository, ListingCache, RepositoryError};
use super::validation::{AdmissionValidator, ValidationErrors};
use super::views::{AdmissionDetailView, AdmissionListView};

/// What callers see when the store rejects a write. The underlying error is
/// only ever logged.
pub const SUBMISSION_FAILED_MESSAGE: &str = "Failed to submit form. Please try again.";
pub const CORRECT_FIELDS_MESSAGE: &str = "Please correct the highlighted fields.";

/// Service composing validation, the admission store and the list cache.
pub struct AdmissionService<R, C> {
    validator: AdmissionValidator,
    repository: Arc<R>,
    cache: Arc<C>,
}

impl<R, C> AdmissionService<R, C>
where
    R: AdmissionRepository + 'static,
    C: ListingCache + 'static,
{
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self {
            validator: AdmissionValidator,
            repository,
            cache,
        }
    }

    /// Validate and persist a submission as one record with its child rows.
    pub fn submit(
        &self,
        submission: AdmissionSubmission,
    ) -> Result<AdmissionRecord, AdmissionServiceError> {
        let details = self.validator.validate(&submission)?;
        let record = AdmissionRecord::new(details);
        let admission_id = record.id.clone();

        let stored = self.repository.insert(record).map_err(|err| {
            error!(admission_id = %admission_id, error = %err, "failed to persist admission");
            AdmissionServiceError::from(err)
        })?;

        self.cache.invalidate();
        info!(
            admission_id = %stored.id,
            branch = %stored.details.basic.school_branch,
            siblings = stored.details.siblings.entries.len(),
            "admission submitted"
        );
        Ok(stored)
    }

    /// Newest-first summary of every admission, served from the cache when warm.
    pub fn list(&self) -> Result<AdmissionListView, AdmissionServiceError> {
        if let Some(view) = self.cache.load() {
            debug!(total = view.total, "admission list served from cache");
            return Ok(view);
        }

        let generation = self.cache.generation();
        let records = self.repository.list_recent().map_err(|err| {
            error!(error = %err, "failed to load admission list");
            AdmissionServiceError::from(err)
        })?;
        let view = AdmissionListView::from_records(&records);
        if !self.cache.store(generation, view.clone()) {
            debug!(total = view.total, "admission list changed while rendering; not cached");
        }
        Ok(view)
    }

    /// Fetch a stored admission by id.
    pub fn get(&self, admission_id: &AdmissionId) -> Result<AdmissionRecord, AdmissionServiceError> {
        self.repository
            .fetch(admission_id)
            .map_err(|err| {
                error!(admission_id = %admission_id, error = %err, "failed to load admission");
                AdmissionServiceError::from(err)
            })?
            .ok_or_else(|| AdmissionServiceError::NotFound(admission_id.clone()))
    }

    /// Sectioned detail rendering for the admin view.
    pub fn detail(
        &self,
        admission_id: &AdmissionId,
    ) -> Result<AdmissionDetailView, AdmissionServiceError> {
        let record = self.get(admission_id)?;
        Ok(AdmissionDetailView::from_record(&record))
    }
}

/// Error raised by the admission service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("admission {0} not found")]
    NotFound(AdmissionId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Caller-facing result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AdmissionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<ValidationErrors>,
}

impl SubmissionOutcome {
    pub fn accepted(id: AdmissionId) -> Self {
        Self {
            success: true,
            id: Some(id),
            error: None,
            field_errors: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            success: false,
            id: None,
            error: Some(SUBMISSION_FAILED_MESSAGE.to_string()),
            field_errors: None,
        }
    }

    pub fn invalid(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(CORRECT_FIELDS_MESSAGE.to_string()),
            field_errors: Some(errors),
        }
    }

    /// Collapse a service result into the caller-facing shape. Storage
    /// failures never leak their text here.
    pub fn from_result(result: &Result<AdmissionRecord, AdmissionServiceError>) -> Self {
        match result {
            Ok(record) => Self::accepted(record.id.clone()),
            Err(AdmissionServiceError::Validation(errors)) => Self::invalid(errors.clone()),
            Err(_) => Self::rejected(),
        }
    }
}
