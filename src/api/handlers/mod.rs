//! HTTP request handlers for API endpoints.

pub mod couriers;
pub mod health;
pub mod orders;

pub use couriers::{create_courier_handler, list_couriers_handler};
pub use health::health_handler;
pub use orders::{create_order_handler, list_orders_handler};
