//! Courier onboarding.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::courier::Courier;
use crate::domain::errors::DomainError;
use crate::domain::kernel::Location;
use crate::domain::repositories::UnitOfWorkFactory;
use crate::error::AppError;

/// A validated request to register a courier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCourierCommand {
    name: String,
    speed: i32,
}

impl CreateCourierCommand {
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] for a blank `name` or a `speed`
    /// that is not positive.
    pub fn new(name: impl Into<String>, speed: i32) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Required("name"));
        }
        if speed <= 0 {
            return Err(DomainError::Required("speed"));
        }
        Ok(Self { name, speed })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }
}

/// Storage place every new courier starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultStorage {
    pub name: String,
    pub volume: i32,
}

impl Default for DefaultStorage {
    fn default() -> Self {
        Self {
            name: "bag".to_string(),
            volume: 10,
        }
    }
}

pub struct CreateCourierHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    storage: DefaultStorage,
}

impl CreateCourierHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, storage: DefaultStorage) -> Self {
        Self {
            uow_factory,
            storage,
        }
    }

    /// Creates a courier at a random location with the default storage
    /// place and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the default storage is invalid.
    /// Storage errors are propagated.
    #[tracing::instrument(skip(self, command), fields(name = %command.name()))]
    pub async fn handle(&self, command: CreateCourierCommand) -> Result<Uuid, AppError> {
        let mut courier = Courier::new(command.name(), command.speed(), Location::random())?;
        courier.add_storage_place(self.storage.name.as_str(), self.storage.volume)?;

        let mut uow = self.uow_factory.create();
        uow.couriers().add(&courier).await?;

        tracing::info!(
            courier_id = %courier.id(),
            x = courier.location().x(),
            y = courier.location().y(),
            "courier created"
        );
        Ok(courier.id())
    }
}
