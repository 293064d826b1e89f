use std::sync::Arc;

use pg_monitoring_demo::config::{self, Config};
use pg_monitoring_demo::db::{PgStore, RequestStore};
use pg_monitoring_demo::metrics::AppMetrics;
use pg_monitoring_demo::{server, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ─────────────────────────────────────────
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // ── 2. Logging + tracing ─────────────────────────────────────
    let telemetry = telemetry::init(&config)?;

    // ── 3. Connection pool ───────────────────────────────────────
    let store = Arc::new(PgStore::connect(&config.database_url)?);

    // Schema creation runs alongside startup; a failure leaves the service
    // up in a degraded state.
    let schema_store = store.clone();
    tokio::spawn(async move {
        match schema_store.init_schema().await {
            Ok(()) => tracing::info!("requests table ready"),
            Err(e) => tracing::error!(error = %e, "failed to initialise database schema"),
        }
    });

    // ── 4. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState::new(store, Arc::new(AppMetrics::new()?)));

    // ── 5. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 6. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config::LISTEN_ADDR).await?;
    tracing::info!(address = %listener.local_addr()?, "App listening at http://localhost:3000");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped, flushing spans");
    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
