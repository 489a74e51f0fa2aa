use axum_helpers::server::{create_production_app, health_router};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use migration::Migrator;
use tracing::info;

mod api;
mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);
    observability::init_metrics();

    info!(
        app = config.app.name,
        version = config.app.version,
        "Starting reference data API"
    );

    let db = database::postgres::connect_from_config_with_retry(
        config.database.clone(),
        Some(config.retry.clone()),
    )
    .await
    .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        database::postgres::run_migrations::<Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    }

    let router = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(&db))?;

    // /health, /ready and /metrics stay outside /api
    let app = router
        .merge(health_router(config.app))
        .merge(api::operational_router(db.clone()));

    create_production_app(app, &config.server, async move {
        info!("Shutting down: closing database connections");
        match db.close().await {
            Ok(()) => info!("PostgreSQL connection closed successfully"),
            Err(e) => tracing::error!(error = %e, "Error closing PostgreSQL"),
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Reference data API shutdown complete");
    Ok(())
}
