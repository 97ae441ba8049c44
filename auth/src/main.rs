use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use akiba_auth::{configure_routes, IdentityService, TokenService};
use akiba_config::{AppConfig, StoreBackend};
use akiba_database::{AccountRepository, AccountStore, Database, DatabaseConfig, InMemoryAccountStore};
use akiba_observability::{init_tracing, TracingConfig};
use anyhow::{bail, Context};
use tracing_actix_web::TracingLogger;

const SERVICE_NAME: &str = "auth-service";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    init_tracing(TracingConfig::for_service(SERVICE_NAME).with_environment(config.environment.clone()));

    if config.uses_default_secret() {
        if config.is_production() {
            bail!("JWT_SECRET must be set in production");
        }
        tracing::warn!("Using the built-in development JWT secret");
    }

    let accounts = build_store(config.store_backend).await?;
    accounts
        .ensure_uniqueness_constraints()
        .await
        .context("Failed to ensure account uniqueness constraints")?;

    let tokens = Arc::new(TokenService::new(&config.jwt).context("Invalid token configuration")?);
    let identity = web::Data::new(IdentityService::new(accounts, Arc::clone(&tokens), &config.identity));

    tracing::info!(
        port = config.port,
        store = ?config.store_backend,
        issuer = %tokens.issuer(),
        "Starting {}",
        SERVICE_NAME
    );

    HttpServer::new(move || {
        App::new()
            .app_data(identity.clone())
            .wrap(TracingLogger::default())
            .configure(|cfg| configure_routes(cfg, Arc::clone(&tokens)))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await?;

    Ok(())
}

async fn build_store(backend: StoreBackend) -> anyhow::Result<Arc<dyn AccountStore>> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory account store; accounts are lost on restart");
            Ok(Arc::new(InMemoryAccountStore::new()))
        }
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let database = Database::connect(&db_config).await?;
            database.migrate().await?;
            tracing::info!("Database migrations applied");
            Ok(Arc::new(AccountRepository::new(database.pool().clone())))
        }
    }
}
