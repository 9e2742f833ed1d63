//! Read-only projections for listing endpoints.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::kernel::Location;
use crate::error::AppError;

/// A courier as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourierView {
    pub id: Uuid,
    pub name: String,
    pub location: Location,
}

/// An order that has not been delivered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: Uuid,
    pub location: Location,
}

/// Query side of the storage. Reads committed state only and never goes
/// through a unit of work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadModel: Send + Sync {
    /// All couriers, by name.
    async fn list_couriers(&self) -> Result<Vec<CourierView>, AppError>;

    /// Orders in `Created` or `Assigned` status, oldest first.
    async fn list_active_orders(&self) -> Result<Vec<OrderView>, AppError>;

    /// Checks that the storage answers.
    async fn ping(&self) -> Result<(), AppError>;
}
