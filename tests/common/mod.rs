#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, routing::get};
use axum_test::TestServer;
use delivery::api::handlers::health_handler;
use delivery::api::routes::api_routes;
use delivery::application::commands::DefaultStorage;
use delivery::domain::courier::Courier;
use delivery::domain::geo::GeoLocator;
use delivery::domain::kernel::Location;
use delivery::domain::repositories::{ReadModel, UnitOfWorkFactory};
use delivery::error::AppError;
use delivery::infrastructure::persistence::InMemoryStore;
use delivery::state::AppState;
use serde_json::json;

/// Resolves every street to the same cell.
pub struct FixedGeoLocator(pub Location);

#[async_trait]
impl GeoLocator for FixedGeoLocator {
    async fn define_location(&self, _street: &str) -> Result<Location, AppError> {
        Ok(self.0)
    }
}

/// Always fails, like an unreachable geolocation service.
pub struct BrokenGeoLocator;

#[async_trait]
impl GeoLocator for BrokenGeoLocator {
    async fn define_location(&self, _street: &str) -> Result<Location, AppError> {
        Err(AppError::internal(
            "Geolocation service error",
            json!({ "source": "geolocation" }),
        ))
    }
}

pub fn location(x: u8, y: u8) -> Location {
    Location::new(x, y).unwrap()
}

pub fn create_test_state(geo: Arc<dyn GeoLocator>) -> (AppState, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(
        store.clone(),
        store.clone(),
        geo,
        DefaultStorage::default(),
    );
    (state, store)
}

pub fn create_state_with_read_model(read_model: Arc<dyn ReadModel>) -> AppState {
    let store = Arc::new(InMemoryStore::new());
    AppState::new(
        store,
        read_model,
        Arc::new(FixedGeoLocator(location(1, 1))),
        DefaultStorage::default(),
    )
}

pub fn create_test_server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes())
        .with_state(state);

    TestServer::new(app).unwrap()
}

/// Stores a courier with one storage place at a known cell.
pub async fn create_test_courier(
    store: &InMemoryStore,
    name: &str,
    speed: i32,
    at: Location,
    volume: i32,
) -> Courier {
    let mut courier = Courier::new(name, speed, at).unwrap();
    courier.add_storage_place("bag", volume).unwrap();
    store.create().couriers().add(&courier).await.unwrap();
    courier
}

/// Answers after a delay, so concurrent requests overlap on the lookup.
pub struct SlowGeoLocator {
    pub location: Location,
    pub delay: std::time::Duration,
}

#[async_trait]
impl GeoLocator for SlowGeoLocator {
    async fn define_location(&self, _street: &str) -> Result<Location, AppError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.location)
    }
}
