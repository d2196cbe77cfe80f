use crate::cli::ServeArgs;
use crate::infra::{admission_service, AppState};
use crate::routes::with_admission_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use school_admissions::config::AppConfig;
use school_admissions::error::AppError;
use school_admissions::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.database.take() {
        config.database.path = path;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = admission_service(&config.database)?;

    let app = with_admission_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "school admissions service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
