use crate::cli::ServeArgs;
use crate::infra::{build_workbench, seed_inbox, AppState, ALL_SCENARIOS};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uw_workbench::config::AppConfig;
use uw_workbench::error::AppError;
use uw_workbench::telemetry;
use uw_workbench::workflows::underwriting::{
    workbench_router, MemoryNotifications, NotificationFanout, TracingNotifications,
    WorkbenchState,
};

const PROGRESSION_TICK: Duration = Duration::from_millis(100);

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

    let notifications = Arc::new(MemoryNotifications::default());
    let sink = NotificationFanout::new()
        .with(notifications.clone())
        .with(Arc::new(TracingNotifications));
    let mut workbench = build_workbench(&config.workbench, Arc::new(sink));
    let seeded = seed_inbox(&mut workbench, ALL_SCENARIOS)?;
    info!(submissions = seeded.len(), "seeded workbench inbox");

    let workbench_state = WorkbenchState::new(workbench, notifications);
    spawn_progression_ticker(workbench_state.clone());

    let app = with_operational_routes(workbench_router(workbench_state))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "cyber underwriting workbench ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Fires scheduled auto-advances once their delay has elapsed.
fn spawn_progression_ticker(state: WorkbenchState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PROGRESSION_TICK);
        loop {
            ticker.tick().await;
            match state.with_workbench(|workbench| workbench.fire_due(Utc::now())) {
                Ok(0) => {}
                Ok(fired) => debug!(fired, "fired scheduled advances"),
                Err(err) => {
                    warn!(error = %err, "progression ticker stopped");
                    break;
                }
            }
        }
    })
}
