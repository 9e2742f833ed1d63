//! Unit of work: one atomic commit across several aggregates.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use super::{CourierRepository, OrderRepository};
use crate::error::AppError;

/// Reference to an aggregate written inside a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateRef {
    Order(Uuid),
    Courier(Uuid),
}

impl fmt::Display for AggregateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(id) => write!(f, "order:{id}"),
            Self::Courier(id) => write!(f, "courier:{id}"),
        }
    }
}

/// Transaction scope for a single use case.
///
/// Between [`begin`](Self::begin) and [`commit`](Self::commit) every write
/// made through [`orders`](Self::orders) and [`couriers`](Self::couriers)
/// becomes durable together or not at all. Without an open transaction each
/// repository write commits by itself.
///
/// A unit that is dropped with an open transaction discards it, so a handler
/// that returns early on error never leaves partial writes behind.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if one is already open.
    /// Returns [`AppError::Internal`] if the storage cannot start one.
    async fn begin(&mut self) -> Result<(), AppError>;

    /// Applies every write made since [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if no transaction is open.
    /// Returns [`AppError::Internal`] if the commit fails; nothing is applied then.
    async fn commit(&mut self) -> Result<(), AppError>;

    /// Discards every write made since [`begin`](Self::begin). No-op without
    /// an open transaction.
    async fn rollback(&mut self) -> Result<(), AppError>;

    fn in_transaction(&self) -> bool;

    /// Records an aggregate written in the current scope.
    fn track(&mut self, aggregate: AggregateRef);

    /// Aggregates written since the last commit or rollback.
    fn tracked(&self) -> Vec<AggregateRef>;

    fn orders(&mut self) -> &mut dyn OrderRepository;

    fn couriers(&mut self) -> &mut dyn CourierRepository;
}

/// Hands out a fresh [`UnitOfWork`] per use-case invocation.
pub trait UnitOfWorkFactory: Send + Sync {
    fn create(&self) -> Box<dyn UnitOfWork>;
}
