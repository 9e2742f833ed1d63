//! Repository trait for the courier aggregate.

use crate::domain::courier::Courier;
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence port for [`Courier`] aggregates, storage places included.
///
/// Same transaction rules as [`super::OrderRepository`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourierRepository: Send {
    /// Inserts a new courier with its storage places.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the id is taken.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn add(&mut self, courier: &Courier) -> Result<(), AppError>;

    /// Saves position and storage place occupancy of an existing courier.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the courier does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn update(&mut self, courier: &Courier) -> Result<(), AppError>;

    /// Loads a courier by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if there is no such courier.
    async fn get(&mut self, id: Uuid) -> Result<Courier, AppError>;

    /// Loads every courier whose storage places are all empty.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no courier is free.
    async fn get_all_free(&mut self) -> Result<Vec<Courier>, AppError>;
}
