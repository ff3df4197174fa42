//! FleetSafe API Server
//!
//! HTTP surface over the driver risk pipeline: behavior analysis, accident
//! predictions, alerts, safety reports and the telemetry simulator. All
//! handlers share one [`AppState`], and with it one alert dispatcher.

use axum::{
    routing::{get, post},
    Router,
};
use cloud_sync::CloudSync;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod rate_limit;
mod routes;
mod settings;
mod state;

pub use error::{ApiError, ErrorBody};
pub use rate_limit::{create_governor_config, DefaultGovernorConfig, RateLimitConfig};
pub use settings::{LoggingSettings, MqttSettings, ServerSettings, Settings};
pub use state::AppState;

/// State handle passed to every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Create the application router without middleware
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .route("/api/v1/behavior/analyze", post(routes::behavior::analyze))
        .route(
            "/api/v1/predictions",
            get(routes::predictions::get_predictions).post(routes::predictions::create_prediction),
        )
        .route("/api/v1/telemetry", get(routes::telemetry::get_telemetry))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/critical", get(routes::alerts::get_critical))
        .route("/api/v1/alerts/:id/read", post(routes::alerts::mark_read))
        .route("/api/v1/alerts/:id/acknowledge", post(routes::alerts::acknowledge))
        .route(
            "/api/v1/reports",
            get(routes::reports::get_reports).post(routes::reports::create_report),
        )
        .route("/api/v1/simulation/start", post(routes::simulation::start))
        .route("/api/v1/simulation/stop", post(routes::simulation::stop))
        .with_state(state)
}

/// Router with tracing, CORS and per-IP rate limiting
pub fn build_app(state: SharedState, rate_limit: &RateLimitConfig) -> Router {
    let router = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match create_governor_config(rate_limit) {
        Some(config) => router.layer(GovernorLayer { config }),
        None => router,
    }
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let level: Level = settings.level.parse()?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Serve `app` with peer addresses available to the rate limiter
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Build every component from `settings` and run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let mut state = AppState::new(settings.clone())?.with_metrics(handle);

    if settings.mqtt.enabled {
        let mut cloud = CloudSync::new(settings.mqtt.cloud.clone());
        cloud.connect().await?;
        state = state.with_cloud(Arc::new(cloud));
    }

    let app = build_app(Arc::new(RwLock::new(state)), &settings.rate_limit);

    info!("Starting API server on {}", settings.server.bind_addr);
    let listener = TcpListener::bind(&settings.server.bind_addr).await?;
    serve(listener, app).await?;

    Ok(())
}
