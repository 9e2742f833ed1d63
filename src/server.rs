//! Service startup and runtime lifecycle.
//!
//! Connects the storage backend, wires the use-case handlers, starts the
//! periodic jobs and serves HTTP until Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;

use crate::config::{Config, StorageBackend};
use crate::domain::geo::GeoLocator;
use crate::domain::repositories::{ReadModel, UnitOfWorkFactory};
use crate::infrastructure::geo::{HttpGeoClient, RandomGeoLocator};
use crate::infrastructure::persistence::{InMemoryStore, PgReadModel, PgUnitOfWorkFactory};
use crate::jobs;
use crate::routes::app_router;
use crate::state::AppState;

/// Write and read sides of the configured storage backend.
pub struct Storage {
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub read_model: Arc<dyn ReadModel>,
}

/// Opens the storage backend selected in `config`.
///
/// For PostgreSQL this creates the pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_storage(config: &Config) -> Result<Storage> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok(Storage {
                uow_factory: store.clone(),
                read_model: store,
            })
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to migrate")?;

            Ok(Storage {
                uow_factory: Arc::new(PgUnitOfWorkFactory::new(pool.clone())),
                read_model: Arc::new(PgReadModel::new(pool)),
            })
        }
    }
}

/// Geolocation client for `GEO_SERVICE_URL`, or random locations without one.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_geo_locator(config: &Config) -> Result<Arc<dyn GeoLocator>> {
    match config.geo_service_url.as_deref() {
        Some(url) => {
            let http_client = reqwest::Client::builder()
                .timeout(config.geo_timeout())
                .build()
                .context("Failed to build geolocation HTTP client")?;
            Ok(Arc::new(HttpGeoClient::new(
                url,
                config.geo_timeout(),
                http_client,
            )?))
        }
        None => Ok(Arc::new(RandomGeoLocator)),
    }
}

/// Builds the application state for `config`.
///
/// # Errors
///
/// See [`connect_storage`] and [`build_geo_locator`].
pub async fn build_state(config: &Config) -> Result<AppState> {
    let storage = connect_storage(config).await?;
    let geo = build_geo_locator(config)?;
    Ok(AppState::new(
        storage.uow_factory,
        storage.read_model,
        geo,
        config.default_storage(),
    ))
}

/// Runs the service with the given configuration.
///
/// Initializes:
/// - Storage backend (PostgreSQL pool + migrations, or in-memory)
/// - Geolocation client
/// - Assignment and movement jobs
/// - Axum HTTP server
///
/// On Ctrl+C the server stops accepting requests, then the jobs finish
/// their current tick and exit.
///
/// # Errors
///
/// Returns an error if:
/// - Storage initialization fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let jobs = [
        jobs::spawn_assign_job(
            state.assign_order.clone(),
            config.assign_interval(),
            shutdown_rx.clone(),
        ),
        jobs::spawn_move_job(
            state.move_couriers.clone(),
            config.move_interval(),
            shutdown_rx,
        ),
    ];

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("HTTP server stopped, waiting for jobs");
    let _ = shutdown_tx.send(true);
    for job in jobs {
        if let Err(e) = job.await {
            tracing::error!(error = %e, "job terminated abnormally");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
