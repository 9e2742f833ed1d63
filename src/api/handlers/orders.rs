//! Handlers for order endpoints.

use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::orders::{CreateOrderRequest, CreateOrderResponse, OrderItem};
use crate::application::commands::CreateOrderCommand;
use crate::error::AppError;
use crate::state::AppState;

/// Registers an order, resolving its street to a grid location.
///
/// # Endpoint
///
/// `POST /api/orders`
///
/// Idempotent by `order_id`: a repeated id returns 201 without creating a
/// second order.
///
/// # Errors
///
/// Returns 400 if the street is blank or the volume is below 1.
/// Returns 500 if the geolocation service fails.
pub async fn create_order_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    payload.validate()?;

    let order_id = payload.order_id.unwrap_or_else(Uuid::new_v4);
    let command = CreateOrderCommand::new(order_id, payload.street, payload.volume)?;
    state.create_order.handle(command).await?;

    Ok((StatusCode::CREATED, Json(CreateOrderResponse { order_id })))
}

/// Lists orders that are not delivered yet.
///
/// # Endpoint
///
/// `GET /api/orders`
pub async fn list_orders_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderItem>>, AppError> {
    let orders = state.get_orders.handle().await?;
    Ok(Json(orders.into_iter().map(OrderItem::from).collect()))
}
