//! Order intake.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::geo::GeoLocator;
use crate::domain::order::Order;
use crate::domain::repositories::UnitOfWorkFactory;
use crate::error::AppError;

/// A validated request to register an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderCommand {
    order_id: Uuid,
    street: String,
    volume: i32,
}

impl CreateOrderCommand {
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] for a nil `order_id`, a blank
    /// `street` or a `volume` that is not positive.
    pub fn new(
        order_id: Uuid,
        street: impl Into<String>,
        volume: i32,
    ) -> Result<Self, DomainError> {
        let street = street.into();
        if order_id.is_nil() {
            return Err(DomainError::Required("order_id"));
        }
        if street.trim().is_empty() {
            return Err(DomainError::Required("street"));
        }
        if volume <= 0 {
            return Err(DomainError::Required("volume"));
        }

        Ok(Self {
            order_id,
            street,
            volume,
        })
    }

    pub fn order_id(&self) -> Uuid {
        self.order_id
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }
}

/// Registers orders coming from upstream, at most once per id.
pub struct CreateOrderHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    geo: Arc<dyn GeoLocator>,
}

impl CreateOrderHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, geo: Arc<dyn GeoLocator>) -> Self {
        Self { uow_factory, geo }
    }

    /// Creates the order unless one with the same id exists already, in
    /// which case this is a successful no-op. That holds for duplicates
    /// arriving at the same time too: losing the insert race is not an error.
    ///
    /// # Errors
    ///
    /// Geolocation and storage errors are propagated unchanged.
    #[tracing::instrument(skip(self, command), fields(order_id = %command.order_id()))]
    pub async fn handle(&self, command: CreateOrderCommand) -> Result<(), AppError> {
        let mut uow = self.uow_factory.create();

        match uow.orders().get(command.order_id()).await {
            Ok(_) => {
                tracing::debug!("order already registered");
                return Ok(());
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let location = self.geo.define_location(command.street()).await?;
        let order = Order::new(command.order_id(), location, command.volume())?;
        match uow.orders().add(&order).await {
            Ok(()) => {}
            // A concurrent delivery of the same id won the insert.
            Err(err) if err.is_conflict() => {
                tracing::debug!("order registered concurrently");
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        tracing::info!(
            x = location.x(),
            y = location.y(),
            volume = order.volume(),
            "order created"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::testing::{StubFactory, StubUnitOfWork};
    use crate::domain::geo::MockGeoLocator;
    use crate::domain::kernel::Location;
    use crate::domain::order::OrderStatus;
    use crate::domain::repositories::{MockCourierRepository, MockOrderRepository};
    use serde_json::json;

    fn command() -> CreateOrderCommand {
        CreateOrderCommand::new(Uuid::new_v4(), "Tverskaya 1", 4).unwrap()
    }

    #[test]
    fn test_command_validation() {
        assert_eq!(
            CreateOrderCommand::new(Uuid::nil(), "Tverskaya 1", 4).unwrap_err(),
            DomainError::Required("order_id")
        );
        assert_eq!(
            CreateOrderCommand::new(Uuid::new_v4(), "  ", 4).unwrap_err(),
            DomainError::Required("street")
        );
        assert_eq!(
            CreateOrderCommand::new(Uuid::new_v4(), "Tverskaya 1", 0).unwrap_err(),
            DomainError::Required("volume")
        );
    }

    #[tokio::test]
    async fn test_create_order() {
        let cmd = command();
        let order_id = cmd.order_id();

        let mut orders = MockOrderRepository::new();
        orders
            .expect_get()
            .times(1)
            .returning(|_| Err(AppError::not_found("order not found", json!({}))));
        orders
            .expect_add()
            .withf(move |o: &Order| {
                o.id() == order_id
                    && o.status() == OrderStatus::Created
                    && o.location() == Location::new(3, 7).unwrap()
                    && o.volume() == 4
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut geo = MockGeoLocator::new();
        geo.expect_define_location()
            .withf(|street| street == "Tverskaya 1")
            .times(1)
            .returning(|_| Ok(Location::new(3, 7).unwrap()));

        let handler = CreateOrderHandler::new(
            StubFactory::new(StubUnitOfWork::new(orders, MockCourierRepository::new())),
            Arc::new(geo),
        );

        handler.handle(cmd).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_existing_order_is_noop() {
        let cmd = command();
        let existing = Order::new(cmd.order_id(), Location::new(1, 1).unwrap(), 4).unwrap();

        let mut orders = MockOrderRepository::new();
        orders
            .expect_get()
            .returning(move |_| Ok(existing.clone()));
        orders.expect_add().never();
        let mut geo = MockGeoLocator::new();
        geo.expect_define_location().never();

        let handler = CreateOrderHandler::new(
            StubFactory::new(StubUnitOfWork::new(orders, MockCourierRepository::new())),
            Arc::new(geo),
        );

        handler.handle(cmd).await.unwrap();
    }

    #[tokio::test]
    async fn test_geolocation_failure_is_propagated() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get()
            .returning(|_| Err(AppError::not_found("order not found", json!({}))));
        orders.expect_add().never();
        let mut geo = MockGeoLocator::new();
        geo.expect_define_location().returning(|_| {
            Err(AppError::internal(
                "Geolocation service error",
                json!({ "source": "geolocation" }),
            ))
        });

        let handler = CreateOrderHandler::new(
            StubFactory::new(StubUnitOfWork::new(orders, MockCourierRepository::new())),
            Arc::new(geo),
        );

        let err = handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_losing_insert_race_is_noop() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_get()
            .returning(|_| Err(AppError::not_found("order not found", json!({}))));
        orders.expect_add().times(1).returning(|_| {
            Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "orders_pkey" }),
            ))
        });
        let mut geo = MockGeoLocator::new();
        geo.expect_define_location()
            .returning(|_| Ok(Location::new(2, 2).unwrap()));

        let handler = CreateOrderHandler::new(
            StubFactory::new(StubUnitOfWork::new(orders, MockCourierRepository::new())),
            Arc::new(geo),
        );

        handler.handle(command()).await.unwrap();
    }
}
