//! EventDesk maintenance entry point
//!
//! Applies pending migrations and reconciles every capacity cache with the
//! participation table. Run on each deploy before the web tier starts.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use eventdesk::{
    config::Settings,
    database::{connection::create_pool, health_check, run_migrations, PgStore, Store},
    services::{LocalMediaStore, ServiceFactory},
    utils::{logging, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", eventdesk::info());

    info!("Connecting to database...");
    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;
    health_check(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let media = Arc::new(LocalMediaStore::new(&settings.media));
    let services = ServiceFactory::new(store, Arc::new(SystemClock), media, settings.clone());

    let status = services.health_check().await;
    if !status.is_healthy() {
        anyhow::bail!("services unhealthy: {}", status.get_issues().join(", "));
    }

    let report = services.event_service.reconcile().await?;
    for correction in &report.corrections {
        if let Some((from, to)) = correction.status_change {
            warn!(event_id = correction.event_id, from = %from, to = %to, "Event status corrected");
        }
    }

    info!(
        checked = report.checked,
        corrected = report.corrections.len(),
        "EventDesk storage is consistent"
    );
    Ok(())
}
