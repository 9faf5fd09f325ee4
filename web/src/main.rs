//! Todo Sync HTTP server.
//!
//! # Usage
//!
//! ```bash
//! SUPABASE_URL=https://abc.supabase.co \
//! SUPABASE_ANON_KEY=... \
//! SITE_URL=http://localhost:8080 \
//!   cargo run --bin todo-server
//! ```
//!
//! Variables may also come from a `.env` file. `RUST_LOG` overrides the
//! default log filter.

use anyhow::Context;
use todo_sync_web::{app_router, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_sync_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        supabase = %config.supabase.url,
        site = %config.supabase.site_url,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config).context("Failed to build Supabase client")?;
    let app = app_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down gracefully...");
}
