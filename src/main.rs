//! Rendezvous events platform
//!
//! Main application entry point

use std::sync::Arc;
use anyhow::Context;
use tracing::{error, info, warn};

use Rendezvous::{
    config::Settings,
    database::{connection, DatabaseService, EntityStore},
    services::ServiceFactory,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", Rendezvous::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig::from(&settings.database);
    let db_pool = connection::create_pool(&db_config)
        .await
        .context("failed to connect to database")?;

    // Run database migrations
    connection::run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool.clone());
    let store: Arc<dyn EntityStore> = Arc::new(database_service);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(settings.clone(), store).await?;

    let database_healthy = match connection::health_check(&db_pool).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Database health check failed");
            false
        }
    };
    let health = services.health_check(database_healthy);
    for issue in health.get_issues() {
        warn!(issue = %issue, "Service health issue");
    }
    if !health.is_healthy() {
        anyhow::bail!("service health check failed");
    }

    info!("Rendezvous is ready");

    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, closing database pool");
    db_pool.close().await;

    info!("Rendezvous has been shut down.");
    Ok(())
}
