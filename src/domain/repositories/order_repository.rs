//! Repository trait for the order aggregate.

use crate::domain::order::Order;
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence port for [`Order`] aggregates.
///
/// Obtained from a [`super::UnitOfWork`]. Writes join the unit's open
/// transaction when there is one, otherwise each write commits on its own.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::postgres::PgOrderRepository`]
/// - [`crate::infrastructure::persistence::memory::MemoryOrderRepository`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send {
    /// Inserts a new order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if an order with the same id exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn add(&mut self, order: &Order) -> Result<(), AppError>;

    /// Saves the current state of an existing order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the order does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&mut self, order: &Order) -> Result<(), AppError>;

    /// Loads an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if there is no such order.
    async fn get(&mut self, id: Uuid) -> Result<Order, AppError>;

    /// Loads the oldest order still in `Created` status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no order is waiting.
    async fn get_first_in_created_status(&mut self) -> Result<Order, AppError>;

    /// Loads every order in `Assigned` status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the result would be empty.
    async fn get_all_in_assigned_status(&mut self) -> Result<Vec<Order>, AppError>;
}
