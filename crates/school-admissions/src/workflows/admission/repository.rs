use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AdmissionDetails, AdmissionId};
use super::views::AdmissionListView;

/// Persisted admission: server-assigned identity plus the validated answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRecord {
    pub id: AdmissionId,
    pub created_at: DateTime<Utc>,
    pub details: AdmissionDetails,
}

impl AdmissionRecord {
    pub fn new(details: AdmissionDetails) -> Self {
        Self {
            id: AdmissionId::generate(),
            created_at: Utc::now(),
            details,
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Records are write-once: there is no update or delete. `insert` must store
/// the parent and all of its sibling and vaccination rows atomically.
pub trait AdmissionRepository: Send + Sync {
    fn insert(&self, record: AdmissionRecord) -> Result<AdmissionRecord, RepositoryError>;
    fn fetch(&self, id: &AdmissionId) -> Result<Option<AdmissionRecord>, RepositoryError>;
    /// Every record with its child rows, newest first.
    fn list_recent(&self) -> Result<Vec<AdmissionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Holds the rendered admin list between writes.
///
/// Readers take a [`generation`](ListingCache::generation) before loading from
/// storage and hand it back to [`store`](ListingCache::store). A view rendered
/// before an invalidation must never be stored after it.
pub trait ListingCache: Send + Sync {
    fn load(&self) -> Option<AdmissionListView>;
    fn generation(&self) -> u64;
    /// Cache `view` unless the cache was invalidated since `generation`.
    /// Returns whether the view was kept.
    fn store(&self, generation: u64, view: AdmissionListView) -> bool;
    /// Drop whatever is cached so the next read re-renders from storage.
    fn invalidate(&self);
}
