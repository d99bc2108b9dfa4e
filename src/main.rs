//! Bookshelf backend entry point.
//!
//! Loads configuration, starts the database and event bus services, then
//! serves the GraphQL API until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use bookshelf::config::Config;
use bookshelf::db::Database;
use bookshelf::graphql::build_schema;
use bookshelf::services::{
    AuthConfig, AuthService, DatabaseService, EventsService, LibraryEvents, ServicesManager,
    init_tracing,
};
use bookshelf::{AppState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    init_tracing(config.log_format)?;
    tracing::info!("Starting Bookshelf");
    if config.jwt_secret_generated {
        tracing::warn!("JWT_SECRET is not set, using a random secret; tokens will not survive a restart");
    }

    let db = Database::connect(&config.database_url, config.database_max_connections)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database_url))?;
    tracing::info!("Database connected");

    let events = LibraryEvents::new(config.event_capacity);

    let mut manager = ServicesManager::new();
    manager.register(Arc::new(DatabaseService::new(db.clone())))?;
    manager.register(Arc::new(EventsService::new(events.clone())))?;
    let services = Arc::new(manager);
    services.start_all().await?;

    let auth = Arc::new(AuthService::new(db.clone(), AuthConfig::from_config(&config)));
    let schema = build_schema(db.clone(), auth.clone(), events);
    tracing::info!("GraphQL schema built");

    let state = AppState {
        config: config.clone(),
        db,
        schema,
        auth,
        services: services.clone(),
    };
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    services.stop_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
