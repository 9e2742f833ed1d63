//! Shared application state injected into HTTP handlers.

use std::sync::Arc;

use crate::application::commands::{
    AssignOrderHandler, CreateCourierHandler, CreateOrderHandler, DefaultStorage,
    MoveCouriersHandler,
};
use crate::application::queries::{GetCouriersHandler, GetOrdersHandler};
use crate::domain::geo::GeoLocator;
use crate::domain::repositories::{ReadModel, UnitOfWorkFactory};

/// Use-case handlers wired to one storage backend.
///
/// Cloned per request; every field is an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    pub create_order: Arc<CreateOrderHandler>,
    pub create_courier: Arc<CreateCourierHandler>,
    pub assign_order: Arc<AssignOrderHandler>,
    pub move_couriers: Arc<MoveCouriersHandler>,
    pub get_couriers: Arc<GetCouriersHandler>,
    pub get_orders: Arc<GetOrdersHandler>,
    pub read_model: Arc<dyn ReadModel>,
}

impl AppState {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        read_model: Arc<dyn ReadModel>,
        geo: Arc<dyn GeoLocator>,
        default_storage: DefaultStorage,
    ) -> Self {
        Self {
            create_order: Arc::new(CreateOrderHandler::new(uow_factory.clone(), geo)),
            create_courier: Arc::new(CreateCourierHandler::new(
                uow_factory.clone(),
                default_storage,
            )),
            assign_order: Arc::new(AssignOrderHandler::new(uow_factory.clone())),
            move_couriers: Arc::new(MoveCouriersHandler::new(uow_factory)),
            get_couriers: Arc::new(GetCouriersHandler::new(read_model.clone())),
            get_orders: Arc::new(GetOrdersHandler::new(read_model.clone())),
            read_model,
        }
    }
}
