/// Recipe Service Main Entry Point
///
/// Starts the HTTP server with:
/// - PostgreSQL connection pool (with migrations)
/// - Email service (SMTP, no-op when unconfigured)
/// - Activation token service
/// - Media storage for post images
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use recipe_service::config::Settings;
use recipe_service::routes::configure_routes;
use recipe_service::security::jwt;
use recipe_service::services::{ActivationService, EmailService, MediaStorage, PgActivationStore};
use signing_core::TimestampSigner;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "recipe_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Recipe Service");

    let settings = Settings::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    jwt::initialize_keys(&settings.security.jwt_secret)
        .context("Failed to initialize JWT keys")?;
    info!("JWT keys initialized");

    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database ready");

    let email_service =
        EmailService::new(&settings.email).context("Failed to configure email service")?;
    if !email_service.is_enabled() {
        info!("Email service running in no-op mode");
    }

    let activation_service = ActivationService::new(
        TimestampSigner::new(&settings.security.secret_key),
        settings.security.activation_max_age_secs,
        PgActivationStore::new(db_pool.clone()),
    );

    let media_storage = MediaStorage::new(settings.media.root.clone());

    let bind_addr = (settings.server.host.clone(), settings.server.port);
    info!(host = %settings.server.host, port = settings.server.port, "Binding HTTP server");

    let pool_data = web::Data::new(db_pool);
    let email_data = web::Data::new(email_service);
    let activation_data = web::Data::new(activation_service);
    let storage_data = web::Data::new(media_storage);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(pool_data.clone())
            .app_data(email_data.clone())
            .app_data(activation_data.clone())
            .app_data(storage_data.clone())
            .configure(configure_routes)
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server terminated with error")
}
