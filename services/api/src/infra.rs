use metrics_exporter_prometheus::PrometheusHandle;
use school_admissions::config::DatabaseConfig;
use school_admissions::workflows::admission::{
    AdmissionService, MemoryListingCache, RepositoryError, SqliteAdmissionRepository,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type AdmissionApiService = AdmissionService<SqliteAdmissionRepository, MemoryListingCache>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Open the admission store and wire it to a fresh list cache.
pub(crate) fn admission_service(
    database: &DatabaseConfig,
) -> Result<Arc<AdmissionApiService>, RepositoryError> {
    let repository = Arc::new(SqliteAdmissionRepository::from_config(database)?);
    info!(
        path = %database.path.display(),
        in_memory = database.is_in_memory(),
        "admission store opened"
    );
    Ok(Arc::new(AdmissionService::new(
        repository,
        Arc::new(MemoryListingCache::default()),
    )))
}
