//! Handlers for courier endpoints.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::couriers::{CourierItem, CreateCourierRequest, CreateCourierResponse};
use crate::application::commands::CreateCourierCommand;
use crate::error::AppError;
use crate::state::AppState;

/// Registers a courier with the default storage place at a random location.
///
/// # Endpoint
///
/// `POST /api/couriers`
///
/// # Errors
///
/// Returns 400 if the name is blank or the speed is below 1.
pub async fn create_courier_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<(StatusCode, Json<CreateCourierResponse>), AppError> {
    payload.validate()?;

    let command = CreateCourierCommand::new(payload.name, payload.speed)?;
    let courier_id = state.create_courier.handle(command).await?;

    Ok((StatusCode::CREATED, Json(CreateCourierResponse { courier_id })))
}

/// Lists all couriers.
///
/// # Endpoint
///
/// `GET /api/couriers`
pub async fn list_couriers_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourierItem>>, AppError> {
    let couriers = state.get_couriers.handle().await?;
    Ok(Json(couriers.into_iter().map(CourierItem::from).collect()))
}
