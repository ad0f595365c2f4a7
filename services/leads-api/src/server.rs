use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jobvault::config::AppConfig;
use jobvault::error::AppError;
use jobvault::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{build_lead_services, AppState};
use crate::routes::with_lead_routes;

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

    let services = build_lead_services(&config)?;
    let fallback = services.admin.fallback();
    let storage_configured = services.storage.is_configured;

    let app = with_lead_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %fallback,
        storage_configured,
        "lead capture service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
