//! DTOs for courier endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::location::LocationDto;
use crate::domain::repositories::CourierView;

/// Request to register a courier.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourierRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Grid cells per movement tick.
    #[validate(range(min = 1))]
    pub speed: i32,
}

#[derive(Debug, Serialize)]
pub struct CreateCourierResponse {
    pub courier_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CourierItem {
    pub id: Uuid,
    pub name: String,
    pub location: LocationDto,
}

impl From<CourierView> for CourierItem {
    fn from(view: CourierView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            location: view.location.into(),
        }
    }
}
