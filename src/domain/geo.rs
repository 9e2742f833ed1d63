//! Geolocation port.

use async_trait::async_trait;

use crate::domain::kernel::Location;
use crate::error::AppError;

/// Resolves a street address to a grid location.
///
/// # Implementations
///
/// - [`crate::infrastructure::geo::HttpGeoClient`] - remote geolocation service
/// - [`crate::infrastructure::geo::RandomGeoLocator`] - random cell, for setups without one
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the lookup fails; callers propagate it unchanged.
    async fn define_location(&self, street: &str) -> Result<Location, AppError>;
}
