//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET /health` - Storage health check
//! - `/api/*`      - Courier and order endpoints, see [`crate::api::routes`]
//!
//! Every request is traced; trailing slashes are trimmed before routing.

use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::tracing;
use crate::state::AppState;

pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::routes::api_routes())
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
