use crate::cli::ServeArgs;
use crate::infra::{build_engine, build_extractor, AppState, InMemoryRecoveryRepository};
use crate::routes::with_replan_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use trip_replan::config::AppConfig;
use trip_replan::error::AppError;
use trip_replan::replan::ReplanService;
use trip_replan::telemetry;

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

    let engine = Arc::new(build_engine(&config.replan));
    let repository = Arc::new(InMemoryRecoveryRepository::default());
    let replan_service = Arc::new(
        ReplanService::new(engine, repository, config.replan.total_timeout)
            .with_extractor(build_extractor()),
    );

    let app = with_replan_routes(replan_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        provider_timeout_ms = config.replan.provider_timeout.as_millis() as u64,
        "trip replan service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
