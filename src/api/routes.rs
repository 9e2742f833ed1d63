//! API route configuration.

use axum::{Router, routing::get};

use crate::api::handlers::{
    create_courier_handler, create_order_handler, list_couriers_handler, list_orders_handler,
};
use crate::state::AppState;

/// Routes mounted under `/api`.
///
/// # Endpoints
///
/// - `GET  /couriers` - List couriers with their position
/// - `POST /couriers` - Register a courier
/// - `GET  /orders`   - List orders not delivered yet
/// - `POST /orders`   - Register an order (idempotent by id)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/couriers",
            get(list_couriers_handler).post(create_courier_handler),
        )
        .route(
            "/orders",
            get(list_orders_handler).post(create_order_handler),
        )
}
