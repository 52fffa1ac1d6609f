use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAlertPublisher};
use crate::routes::with_triage_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ed_triage::config::AppConfig;
use ed_triage::error::AppError;
use ed_triage::telemetry;
use ed_triage::workflows::triage::{TriageDeskService, TriageSettings};
use std::sync::atomic::Ordering;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let triage_service = Arc::new(TriageDeskService::new(
        TriageSettings::default(),
        &config.admission.prefix,
        alerts,
    ));

    let app = with_triage_routes(triage_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        admission_prefix = %config.admission.prefix,
        "triage desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
