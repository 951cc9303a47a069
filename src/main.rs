use anyhow::Context;
use tracing_subscriber::EnvFilter;

use surprise_tokri::app::{app, AppState};
use surprise_tokri::config::config;
use surprise_tokri::database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("surprise_tokri=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    config.validate()?;
    tracing::info!("Starting Surprise Tokri API in {:?} mode", config.environment);

    let store = database::connect(&config.database)
        .await
        .context("failed to open document store")?;
    tracing::info!("Document store: {}", store.backend_name());

    let state = AppState::new(store, config.clone());

    if let Some(admin) = &config.security.bootstrap_admin {
        state
            .services
            .users
            .ensure_admin(&admin.email, &admin.password, "Administrator")
            .await
            .context("failed to bootstrap admin account")?;
    }

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Surprise Tokri API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
