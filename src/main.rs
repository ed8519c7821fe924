//! ledger_bank - Banking Backend API
//!
//! Customers, accounts and an atomic deposit/withdrawal ledger over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_bank::api::RemoteAuthVerifier;
use ledger_bank::config::LedgerBackend;
use ledger_bank::domain::SystemClock;
use ledger_bank::store::{InMemoryLedgerStore, PgLedgerStore};
use ledger_bank::{build_router, db, AppState, Config};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ledger_bank=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect to PostgreSQL and refuse to start on an incomplete schema
async fn connect(config: &Config, database_url: &str) -> anyhow::Result<PgPool> {
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;

    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(backend = ?config.backend, "Starting ledger_bank server");

    let mut pool = None;
    let state = match config.backend {
        LedgerBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;
            let connected = connect(&config, database_url).await?;
            let store = Arc::new(PgLedgerStore::new(connected.clone()));
            pool = Some(connected);
            AppState {
                ledger: store.clone(),
                customers: store,
                clock: Arc::new(SystemClock),
                verifier: Arc::new(RemoteAuthVerifier::new(&config.auth_server_url)),
            }
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using the in-memory ledger; data is lost on shutdown");
            let store = Arc::new(InMemoryLedgerStore::with_sample_customers()?);
            AppState {
                ledger: store.clone(),
                customers: store,
                clock: Arc::new(SystemClock),
                verifier: Arc::new(RemoteAuthVerifier::new(&config.auth_server_url)),
            }
        }
    };

    let app = build_router(state, config.frontend_origin.as_deref());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed. Goodbye!");
    }

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
