use crate::cli::ServeArgs;
use crate::infra::{build_store, schema_options, AppState, InMemoryFormSessionRepository};
use crate::routes::with_form_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use signup_forms::config::AppConfig;
use signup_forms::error::AppError;
use signup_forms::forms::RegistrationService;
use signup_forms::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(build_store(&config.storage)?);
    let sessions = Arc::new(InMemoryFormSessionRepository::default());
    let service = Arc::new(RegistrationService::new(
        sessions,
        store,
        config.storage.bucket.clone(),
        schema_options(&config.forms),
    ));

    let app = with_form_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        bucket = %config.storage.bucket,
        "signup form service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
