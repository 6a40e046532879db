use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::Settings;
use server::db::{create_pool, initialize_schema};
use server::handlers::contracts;
use server::registry::HttpPersonRegistry;
use server::services::pipeline::ContractPipeline;

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env().context("Failed to load settings")?;
    std::fs::create_dir_all(&settings.template_dir)
        .context("Failed to create template directory")?;
    std::fs::create_dir_all(&settings.contracts_dir)
        .context("Failed to create contracts directory")?;

    let pool = create_pool(&settings.database_url)?;
    initialize_schema(&pool)?;

    let registry = Arc::new(HttpPersonRegistry::new(settings.registry_base_url.clone()));
    let pipeline = web::Data::new(ContractPipeline::new(pool, registry, &settings));

    let bind_addr =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!(%bind_addr, "Contract server starting");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(pipeline.clone())
            .configure(contracts::configure)
    })
    .bind(&bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server terminated")
}
