//! PostgreSQL persistence.
//!
//! All repositories handed out by one [`PgUnitOfWork`] share a [`Session`]:
//! the pool plus the transaction opened by `begin`, if any. Writes join that
//! transaction; without one, every repository call runs in its own short
//! transaction so multi-statement writes (a courier and its storage places)
//! still land atomically.
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` rows;
//! the schema lives in `migrations/`.

pub mod pg_courier_repository;
pub mod pg_order_repository;
pub mod pg_read_model;
pub mod unit_of_work;

pub use pg_courier_repository::PgCourierRepository;
pub use pg_order_repository::PgOrderRepository;
pub use pg_read_model::PgReadModel;
pub use unit_of_work::{PgUnitOfWork, PgUnitOfWorkFactory};

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::domain::kernel::Location;
use crate::domain::repositories::AggregateRef;
use crate::error::AppError;

/// Connection state shared by the repositories of one unit of work.
pub(crate) struct Session {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

pub(crate) type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Aggregates written through a unit of work since its last commit/rollback.
pub(crate) type Tracked = Arc<Mutex<Vec<AggregateRef>>>;

pub(crate) fn track(tracked: &Tracked, aggregate: AggregateRef) {
    tracked
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(aggregate);
}

impl Session {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }

    /// Connection for reads: the open transaction or a pooled connection.
    pub(crate) async fn reader(&mut self) -> Result<Scope<'_>, AppError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(Scope::Joined(tx)),
            None => Ok(Scope::Pooled(self.pool.acquire().await?)),
        }
    }

    /// Connection for writes: the open transaction or a fresh one that
    /// [`Scope::finish`] commits.
    pub(crate) async fn writer(&mut self) -> Result<Scope<'_>, AppError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(Scope::Joined(tx)),
            None => Ok(Scope::Own(self.pool.begin().await?)),
        }
    }
}

pub(crate) enum Scope<'a> {
    Joined(&'a mut Transaction<'static, Postgres>),
    Own(Transaction<'static, Postgres>),
    Pooled(PoolConnection<Postgres>),
}

impl Scope<'_> {
    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        match self {
            Scope::Joined(tx) => &mut ***tx,
            Scope::Own(tx) => &mut **tx,
            Scope::Pooled(conn) => &mut **conn,
        }
    }

    /// Commits a transaction this scope opened itself. Joined scopes are left
    /// to the unit of work.
    pub(crate) async fn finish(self) -> Result<(), AppError> {
        if let Scope::Own(tx) = self {
            tx.commit().await?;
        }
        Ok(())
    }
}

/// Converts stored coordinates back into a [`Location`].
pub(crate) fn location_from_row(x: i16, y: i16) -> Result<Location, AppError> {
    let corrupt = || {
        AppError::internal(
            "Corrupt location in storage",
            json!({ "location_x": x, "location_y": y }),
        )
    };
    let x = u8::try_from(x).map_err(|_| corrupt())?;
    let y = u8::try_from(y).map_err(|_| corrupt())?;
    Location::new(x, y).map_err(|_| corrupt())
}
