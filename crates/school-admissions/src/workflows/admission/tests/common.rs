use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::admission::cache::MemoryListingCache;
use crate::workflows::admission::domain::{
    AdmissionDetails, AdmissionId, AdmissionSubmission, SiblingEntry, VaccinationEntry,
};
use crate::workflows::admission::repository::{
    AdmissionRecord, AdmissionRepository, ListingCache, RepositoryError,
};
use crate::workflows::admission::service::AdmissionService;
use crate::workflows::admission::sqlite::SqliteAdmissionRepository;
use crate::workflows::admission::validation::AdmissionValidator;
use crate::workflows::admission::views::AdmissionListView;

pub(super) fn submission() -> AdmissionSubmission {
    AdmissionSubmission {
        school_branch: "T. Pudur".to_string(),
        purpose_of_form: "New Admission".to_string(),
        academic_year: "2025-2026".to_string(),
        student_full_name: "Anika Raman".to_string(),
        date_of_birth: "2018-04-12".to_string(),
        gender: "Female".to_string(),
        nationality: "Indian".to_string(),
        caste_category: "General".to_string(),
        aadhaar_number: "123412341234".to_string(),
        blood_group: "O+".to_string(),
        current_residential_address: "14 Temple Street, T. Pudur".to_string(),
        admission_type: "New Admission".to_string(),
        standard_applying_for: "Grade 2".to_string(),
        father_full_name: "Suresh Raman".to_string(),
        father_occupation: "Engineer".to_string(),
        father_mobile_number: "9876543210".to_string(),
        father_email: "suresh.raman@example.com".to_string(),
        mother_full_name: "Lakshmi Raman".to_string(),
        mother_occupation: "Teacher".to_string(),
        mother_mobile_number: "9123456780".to_string(),
        declaration_accepted: true,
        ..AdmissionSubmission::blank()
    }
}

pub(super) fn submission_with_siblings(names: &[&str]) -> AdmissionSubmission {
    AdmissionSubmission {
        has_siblings_in_school: true,
        siblings: names
            .iter()
            .enumerate()
            .map(|(index, name)| SiblingEntry {
                name: name.to_string(),
                class_grade: format!("Grade {}", index + 4),
                roll_number: String::new(),
                branch: "Surakullam".to_string(),
            })
            .collect(),
        ..submission()
    }
}

pub(super) fn vaccination(name: &str, date: &str) -> VaccinationEntry {
    VaccinationEntry {
        vaccine_name: name.to_string(),
        vaccination_date: date.to_string(),
    }
}

pub(super) fn details() -> AdmissionDetails {
    AdmissionValidator
        .validate(&submission())
        .expect("fixture submission is valid")
}

pub(super) fn details_for(submission: &AdmissionSubmission) -> AdmissionDetails {
    AdmissionValidator
        .validate(submission)
        .expect("submission is valid")
}

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn record_at(student_name: &str, created_at: DateTime<Utc>) -> AdmissionRecord {
    let mut details = details();
    details.student.full_name = student_name.to_string();
    AdmissionRecord {
        id: AdmissionId::generate(),
        created_at,
        details,
    }
}

pub(super) fn repository() -> Arc<SqliteAdmissionRepository> {
    Arc::new(SqliteAdmissionRepository::in_memory().expect("in-memory database opens"))
}

pub(super) type SqliteService = AdmissionService<SqliteAdmissionRepository, MemoryListingCache>;

pub(super) fn build_service() -> (
    SqliteService,
    Arc<SqliteAdmissionRepository>,
    Arc<MemoryListingCache>,
) {
    let repository = repository();
    let cache = Arc::new(MemoryListingCache::default());
    let service = AdmissionService::new(repository.clone(), cache.clone());
    (service, repository, cache)
}

pub(super) const STORAGE_DETAIL: &str = "disk I/O error at /var/lib/admissions.sqlite3";

/// Store that fails every call with a detailed error nobody outside should see.
#[derive(Default, Clone, Copy)]
pub(super) struct UnavailableRepository;

impl AdmissionRepository for UnavailableRepository {
    fn insert(&self, _record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable(STORAGE_DETAIL.to_string()))
    }

    fn fetch(&self, _id: &AdmissionId) -> Result<Option<AdmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable(STORAGE_DETAIL.to_string()))
    }

    fn list_recent(&self) -> Result<Vec<AdmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable(STORAGE_DETAIL.to_string()))
    }
}

/// Cache wrapper counting invalidations.
#[derive(Default)]
pub(super) struct CountingCache {
    inner: MemoryListingCache,
    invalidations: AtomicUsize,
}

impl CountingCache {
    pub(super) fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl ListingCache for CountingCache {
    fn load(&self) -> Option<AdmissionListView> {
        self.inner.load()
    }

    fn generation(&self) -> u64 {
        self.inner.generation()
    }

    fn store(&self, generation: u64, view: AdmissionListView) -> bool {
        self.inner.store(generation, view)
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate();
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("valid json")
}

pub(super) async fn assert_json_status(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    read_json_body(response).await
}
