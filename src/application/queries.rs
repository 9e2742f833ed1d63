//! Read-side use cases.

use std::sync::Arc;

use crate::domain::repositories::{CourierView, OrderView, ReadModel};
use crate::error::AppError;

/// Lists all couriers with their current position.
pub struct GetCouriersHandler {
    read_model: Arc<dyn ReadModel>,
}

impl GetCouriersHandler {
    pub fn new(read_model: Arc<dyn ReadModel>) -> Self {
        Self { read_model }
    }

    pub async fn handle(&self) -> Result<Vec<CourierView>, AppError> {
        self.read_model.list_couriers().await
    }
}

/// Lists orders that still need delivering.
pub struct GetOrdersHandler {
    read_model: Arc<dyn ReadModel>,
}

impl GetOrdersHandler {
    pub fn new(read_model: Arc<dyn ReadModel>) -> Self {
        Self { read_model }
    }

    pub async fn handle(&self) -> Result<Vec<OrderView>, AppError> {
        self.read_model.list_active_orders().await
    }
}
