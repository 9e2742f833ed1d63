//! DTOs for order endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::location::LocationDto;
use crate::domain::repositories::OrderView;

/// Request to register an order.
///
/// `order_id` comes from upstream; a random one is generated when omitted.
/// Sending the same id again is accepted and changes nothing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub order_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255))]
    pub street: String,

    #[validate(range(min = 1))]
    pub volume: i32,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub location: LocationDto,
}

impl From<OrderView> for OrderItem {
    fn from(view: OrderView) -> Self {
        Self {
            id: view.id,
            location: view.location.into(),
        }
    }
}
