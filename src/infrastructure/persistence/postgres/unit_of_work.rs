//! PostgreSQL unit of work.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;

use super::{PgCourierRepository, PgOrderRepository, Session, SharedSession, Tracked};
use crate::domain::repositories::{
    AggregateRef, CourierRepository, OrderRepository, UnitOfWork, UnitOfWorkFactory,
};
use crate::error::AppError;

/// Creates one [`PgUnitOfWork`] per use case, all drawing from the same pool.
#[derive(Clone)]
pub struct PgUnitOfWorkFactory {
    pool: PgPool,
}

impl PgUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    fn create(&self) -> Box<dyn UnitOfWork> {
        Box::new(PgUnitOfWork::new(self.pool.clone()))
    }
}

/// Transaction scope backed by a `sqlx` transaction.
///
/// Dropping the unit with an open transaction rolls it back.
pub struct PgUnitOfWork {
    session: SharedSession,
    tracked: Tracked,
    open: bool,
    orders: PgOrderRepository,
    couriers: PgCourierRepository,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        let session: SharedSession = Arc::new(tokio::sync::Mutex::new(Session::new(pool)));
        let tracked: Tracked = Arc::new(Mutex::new(Vec::new()));
        Self {
            orders: PgOrderRepository::new(Arc::clone(&session), Arc::clone(&tracked)),
            couriers: PgCourierRepository::new(Arc::clone(&session), Arc::clone(&tracked)),
            session,
            tracked,
            open: false,
        }
    }

    fn clear_tracked(&self) {
        self.tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn begin(&mut self) -> Result<(), AppError> {
        let mut session = self.session.lock().await;
        if session.tx.is_some() {
            return Err(AppError::conflict(
                "Transaction already started",
                json!({ "reason": "transaction_open" }),
            ));
        }
        let tx = session.pool.begin().await?;
        session.tx = Some(tx);
        self.open = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let tx = self.session.lock().await.tx.take().ok_or_else(|| {
            AppError::bad_request(
                "No transaction to commit",
                json!({ "reason": "transaction_not_started" }),
            )
        })?;
        self.open = false;

        let aggregates = self.tracked();
        self.clear_tracked();
        tx.commit().await?;

        tracing::debug!(aggregates = aggregates.len(), "transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        let tx = self.session.lock().await.tx.take();
        self.open = false;
        self.clear_tracked();
        if let Some(tx) = tx {
            tx.rollback().await?;
            tracing::debug!("transaction rolled back");
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.open
    }

    fn track(&mut self, aggregate: AggregateRef) {
        super::track(&self.tracked, aggregate);
    }

    fn tracked(&self) -> Vec<AggregateRef> {
        self.tracked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn orders(&mut self) -> &mut dyn OrderRepository {
        &mut self.orders
    }

    fn couriers(&mut self) -> &mut dyn CourierRepository {
        &mut self.couriers
    }
}
