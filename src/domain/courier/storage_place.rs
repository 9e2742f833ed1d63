//! Storage place entity: a capacity slot inside a courier.

use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Smallest volume a storage place can have or an order can occupy.
pub const MIN_VOLUME: i32 = 1;

/// A named slot in a courier's equipment (bag, trunk, ...).
///
/// Holds at most one order at a time. A place only accepts an order whose
/// volume fits its total volume, and only while it is empty.
#[derive(Debug, Clone)]
pub struct StoragePlace {
    id: Uuid,
    name: String,
    total_volume: i32,
    order_id: Option<Uuid>,
}

impl StoragePlace {
    /// Creates an empty storage place.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if `name` is blank or
    /// `total_volume` is below [`MIN_VOLUME`].
    pub fn new(name: impl Into<String>, total_volume: i32) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Required("name"));
        }
        if total_volume < MIN_VOLUME {
            return Err(DomainError::Required("total_volume"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            total_volume,
            order_id: None,
        })
    }

    /// Rebuilds a storage place from persisted state without validation.
    pub(crate) fn restore(
        id: Uuid,
        name: String,
        total_volume: i32,
        order_id: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            name,
            total_volume,
            order_id,
        }
    }

    /// Whether an order of `volume` can be put here right now.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if `volume` is below [`MIN_VOLUME`].
    pub fn can_store(&self, volume: i32) -> Result<bool, DomainError> {
        if volume < MIN_VOLUME {
            return Err(DomainError::Required("volume"));
        }
        Ok(volume <= self.total_volume && !self.is_occupied())
    }

    /// Puts an order into this place.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Required`] for a nil order id or a too small volume
    /// - [`DomainError::CannotStore`] if the place is taken or too small
    pub fn store(&mut self, order_id: Uuid, volume: i32) -> Result<(), DomainError> {
        if order_id.is_nil() {
            return Err(DomainError::Required("order_id"));
        }
        if !self.can_store(volume)? {
            return Err(DomainError::CannotStore);
        }

        self.order_id = Some(order_id);
        Ok(())
    }

    /// Takes the given order out of this place.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Required`] for a nil order id
    /// - [`DomainError::NotStoredHere`] if the place holds something else or nothing
    pub fn clear(&mut self, order_id: Uuid) -> Result<(), DomainError> {
        if order_id.is_nil() {
            return Err(DomainError::Required("order_id"));
        }
        if !self.holds(order_id) {
            return Err(DomainError::NotStoredHere);
        }

        self.order_id = None;
        Ok(())
    }

    pub fn is_occupied(&self) -> bool {
        self.order_id.is_some()
    }

    pub fn holds(&self, order_id: Uuid) -> bool {
        self.order_id == Some(order_id)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_volume(&self) -> i32 {
        self.total_volume
    }

    pub fn order_id(&self) -> Option<Uuid> {
        self.order_id
    }
}

impl PartialEq for StoragePlace {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StoragePlace {}
