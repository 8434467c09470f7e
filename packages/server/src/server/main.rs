// Main entry point for the EchoCare portal server

use std::sync::Arc;

use anyhow::{Context, Result};
use portal_core::domains::auth::JwtService;
use portal_core::domains::profiles::types::DirectoryPolicy;
use portal_core::kernel::{
    create_email_service, PostgresIdentityProvider, PostgresOtpRequestStore,
    PostgresProfileStore, ServerDeps,
};
use portal_core::server::{build_app, AppOptions};
use portal_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,portal_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting EchoCare portal server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let email = create_email_service(&config.email).context("Failed to configure email")?;

    let directory_policy = DirectoryPolicy {
        fallback_to_all_on_empty: config.directory_fallback_to_all,
    };
    if directory_policy.fallback_to_all_on_empty {
        tracing::warn!("Directory fallback enabled: empty queries return all profiles");
    }

    let deps = ServerDeps::new(
        Arc::new(PostgresOtpRequestStore::new(pool.clone())),
        Arc::new(PostgresProfileStore::new(pool.clone())),
        Arc::new(PostgresIdentityProvider::new(pool.clone(), jwt_service)),
        email,
        directory_policy,
    );

    // Build application
    let app = build_app(
        deps,
        Some(pool),
        AppOptions {
            allowed_origins: config.allowed_origins.clone(),
            rate_limit: true,
        },
    )?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
