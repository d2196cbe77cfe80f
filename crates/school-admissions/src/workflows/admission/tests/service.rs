use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::workflows::admission::cache::MemoryListingCache;
use crate::workflows::admission::domain::{AdmissionId, AdmissionSubmission, SchoolBranch};
use crate::workflows::admission::repository::{
    AdmissionRecord, AdmissionRepository, ListingCache, RepositoryError,
};
use crate::workflows::admission::sqlite::SqliteAdmissionRepository;
use crate::workflows::admission::service::{
    AdmissionService, AdmissionServiceError, SubmissionOutcome, CORRECT_FIELDS_MESSAGE,
    SUBMISSION_FAILED_MESSAGE,
};
use crate::workflows::admission::views::{AdmissionListView, EMPTY_LIST_MESSAGE};

#[test]
fn submit_persists_siblings_and_fetches_them_back() {
    let (service, repository, _) = build_service();

    let record = service
        .submit(submission_with_siblings(&["Kavin", "Meera"]))
        .expect("submission succeeds");

    let stored = repository
        .fetch(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    let names: Vec<&str> = stored
        .details
        .siblings
        .entries
        .iter()
        .map(|sibling| sibling.name.as_str())
        .collect();
    assert_eq!(names, ["Kavin", "Meera"]);
    assert!(stored
        .details
        .siblings
        .entries
        .iter()
        .all(|sibling| sibling.branch == SchoolBranch::Surakullam));
    assert_eq!(stored, record);
}

#[test]
fn submit_rejects_invalid_payloads_without_writing() {
    let (service, repository, cache) = build_service();
    assert!(cache.store(cache.generation(), AdmissionListView::from_records(&[])));

    let invalid = AdmissionSubmission {
        aadhaar_number: "1234".to_string(),
        ..submission()
    };
    match service.submit(invalid) {
        Err(AdmissionServiceError::Validation(errors)) => {
            assert!(errors.contains("aadhaarNumber"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repository.list_recent().expect("list loads").is_empty());
    assert!(cache.load().is_some(), "failed writes keep the cached list");
}

#[test]
fn get_reports_not_found_for_unknown_ids() {
    let (service, _, _) = build_service();
    let missing = AdmissionId("does-not-exist".to_string());

    match service.get(&missing) {
        Err(AdmissionServiceError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(matches!(
        service.detail(&missing),
        Err(AdmissionServiceError::NotFound(_))
    ));
}

#[test]
fn list_is_cached_until_the_next_write() {
    let (service, _, cache) = build_service();

    let empty = service.list().expect("list loads");
    assert_eq!(empty.total, 0);
    assert_eq!(empty.empty_message, Some(EMPTY_LIST_MESSAGE));
    assert!(cache.load().is_some(), "list render is cached");

    service.submit(submission()).expect("submission succeeds");
    assert!(cache.load().is_none(), "write invalidates the cache");

    let refreshed = service.list().expect("list loads");
    assert_eq!(refreshed.total, 1);
    assert_eq!(refreshed.empty_message, None);
}

#[test]
fn list_is_served_from_cache_when_warm() {
    let (service, repository, cache) = build_service();
    service.list().expect("list warms cache");

    // Bypasses the service, so nothing invalidates the cache.
    repository
        .insert(record_at("Direct Insert", at(9, 0)))
        .expect("insert succeeds");

    assert_eq!(service.list().expect("list loads").total, 0);
    cache.invalidate();
    assert_eq!(service.list().expect("list loads").total, 1);
}

/// Store whose first `list_recent` holds its result until the test lets it go.
struct PausedListing {
    inner: Arc<SqliteAdmissionRepository>,
    pause_next: AtomicBool,
    read_done: Barrier,
    resume: Barrier,
}

impl PausedListing {
    fn new(inner: Arc<SqliteAdmissionRepository>) -> Self {
        Self {
            inner,
            pause_next: AtomicBool::new(true),
            read_done: Barrier::new(2),
            resume: Barrier::new(2),
        }
    }
}

impl AdmissionRepository for PausedListing {
    fn insert(&self, record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &AdmissionId) -> Result<Option<AdmissionRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list_recent(&self) -> Result<Vec<AdmissionRecord>, RepositoryError> {
        let records = self.inner.list_recent()?;
        if self.pause_next.swap(false, Ordering::SeqCst) {
            self.read_done.wait();
            self.resume.wait();
        }
        Ok(records)
    }
}

#[test]
fn write_during_list_render_is_visible_to_the_next_list() {
    let store = Arc::new(PausedListing::new(repository()));
    let service = Arc::new(AdmissionService::new(
        store.clone(),
        Arc::new(MemoryListingCache::default()),
    ));

    let reader = {
        let service = service.clone();
        thread::spawn(move || service.list().expect("list loads").total)
    };
    store.read_done.wait();
    service.submit(submission()).expect("submission succeeds");
    store.resume.wait();

    assert_eq!(reader.join().expect("reader finishes"), 0);
    assert_eq!(service.list().expect("list loads").total, 1);
}

#[test]
fn each_successful_write_invalidates_once() {
    let cache = Arc::new(CountingCache::default());
    let service = AdmissionService::new(repository(), cache.clone());

    service.submit(submission()).expect("first submission");
    service.submit(submission()).expect("second submission");
    let _ = service.submit(AdmissionSubmission::blank());

    assert_eq!(cache.invalidations(), 2);
}

#[test]
fn persistence_failure_surfaces_generic_message() {
    let cache = Arc::new(CountingCache::default());
    let service = AdmissionService::new(Arc::new(UnavailableRepository), cache.clone());

    let result = service.submit(submission());
    assert!(matches!(
        result,
        Err(AdmissionServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert_eq!(cache.invalidations(), 0);

    let outcome = SubmissionOutcome::from_result(&result);
    assert!(!outcome.success);
    assert_eq!(outcome.id, None);
    assert_eq!(outcome.error.as_deref(), Some(SUBMISSION_FAILED_MESSAGE));
    let json = serde_json::to_string(&outcome).expect("serializes");
    assert!(!json.contains("disk"), "storage detail leaked: {json}");
}

#[test]
fn validation_outcome_carries_field_errors() {
    let service = AdmissionService::new(repository(), Arc::new(MemoryListingCache::default()));
    let result = service.submit(AdmissionSubmission {
        father_mobile_number: "12345".to_string(),
        ..submission()
    });

    let outcome = SubmissionOutcome::from_result(&result);
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some(CORRECT_FIELDS_MESSAGE));
    let field_errors = outcome.field_errors.expect("field errors present");
    assert_eq!(
        field_errors.messages_for("fatherMobileNumber"),
        ["Mobile must be 10 digits".to_string()]
    );
}

#[test]
fn successful_outcome_serializes_success_and_id() {
    let (service, _, _) = build_service();
    let result = service.submit(submission());
    let outcome = SubmissionOutcome::from_result(&result);

    let value = serde_json::to_value(&outcome).expect("serializes");
    assert_eq!(value["success"], serde_json::Value::Bool(true));
    assert!(value["id"].is_string());
    assert!(value.get("error").is_none());
    assert!(value.get("fieldErrors").is_none());
}
