//! Products API - REST server over PostgreSQL

use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{PgProductRepository, ProductService};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        "Connecting to PostgreSQL at {}",
        config.postgres.redacted_url()
    );

    let repository = PgProductRepository::connect(config.postgres.clone()).await?;
    let db = repository.db().clone();

    info!("Successfully connected to PostgreSQL");

    let state = AppState {
        config: config.clone(),
        products: ProductService::new(repository),
    };

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.clone()));

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    create_production_app(
        app,
        &config.server,
        config.server.shutdown_timeout,
        async move {
            info!("Shutting down: closing PostgreSQL connections");
            database::postgres::close(db).await;
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
