//! FleetSafe Risk Pipeline - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== FleetSafe Risk Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Scoring vehicle {} for customer {}",
        settings.pipeline.vehicle_id, settings.pipeline.customer_id
    );

    run_server(settings).await
}
