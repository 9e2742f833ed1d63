//! Courier aggregate: identity, speed, position and storage places.
//!
//! The courier owns capacity allocation (which storage place receives an
//! order) and movement over the grid. Operations that also touch an
//! [`Order`] validate both aggregates first and only then mutate them, so an
//! error never leaves one side changed without the other.

pub mod storage_place;

pub use storage_place::{MIN_VOLUME, StoragePlace};

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::kernel::Location;
use crate::domain::order::Order;

/// Slowest allowed courier, in grid cells per tick.
pub const MIN_SPEED: i32 = 1;

/// Outcome of putting an order into (or taking it out of) a courier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPlacement {
    pub courier_id: Uuid,
    pub order_id: Uuid,
    pub storage_place_id: Uuid,
}

/// A courier moving over the delivery grid.
#[derive(Debug, Clone)]
pub struct Courier {
    id: Uuid,
    name: String,
    speed: i32,
    location: Location,
    storage_places: Vec<StoragePlace>,
}

impl Courier {
    /// Creates a courier without storage places.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if `name` is blank, `speed` is below
    /// [`MIN_SPEED`] or `location` is empty.
    pub fn new(
        name: impl Into<String>,
        speed: i32,
        location: Location,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Required("name"));
        }
        if speed < MIN_SPEED {
            return Err(DomainError::Required("speed"));
        }
        if location.is_empty() {
            return Err(DomainError::Required("location"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            speed,
            location,
            storage_places: Vec::new(),
        })
    }

    /// Rebuilds a courier from persisted state without validation.
    ///
    /// `storage_places` must already be in insertion order.
    pub(crate) fn restore(
        id: Uuid,
        name: String,
        speed: i32,
        location: Location,
        storage_places: Vec<StoragePlace>,
    ) -> Self {
        Self {
            id,
            name,
            speed,
            location,
            storage_places,
        }
    }

    /// Appends a new empty storage place.
    ///
    /// # Errors
    ///
    /// Same as [`StoragePlace::new`].
    pub fn add_storage_place(
        &mut self,
        name: impl Into<String>,
        volume: i32,
    ) -> Result<(), DomainError> {
        let place = StoragePlace::new(name, volume)?;
        self.storage_places.push(place);
        Ok(())
    }

    /// Whether any storage place can hold `order` right now.
    pub fn can_take_order(&self, order: &Order) -> Result<bool, DomainError> {
        Ok(self.first_fit(order.volume())?.is_some())
    }

    /// Stores `order` in the first storage place that fits and assigns the
    /// order to this courier.
    ///
    /// Storage places are tried in the order they were added.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NoStoragePlace`] if no place can hold the order
    /// - [`DomainError::AlreadyAssigned`] if the order is not in `Created` status
    ///
    /// Neither the courier nor the order is modified on error.
    pub fn take_order(&mut self, order: &mut Order) -> Result<OrderPlacement, DomainError> {
        let index = self
            .first_fit(order.volume())?
            .ok_or(DomainError::NoStoragePlace)?;
        order.check_assignable(self.id)?;

        let place = &mut self.storage_places[index];
        place.store(order.id(), order.volume())?;
        if let Err(err) = order.assign(self.id) {
            // Keep both aggregates consistent if the order refused the courier.
            place.clear(order.id())?;
            return Err(err);
        }

        Ok(OrderPlacement {
            courier_id: self.id,
            order_id: order.id(),
            storage_place_id: place.id(),
        })
    }

    /// Frees the storage place holding `order` and marks the order completed.
    ///
    /// # Errors
    ///
    /// - [`DomainError::OrderStorageNotFound`] if no place holds the order
    /// - [`DomainError::NotAssigned`] / [`DomainError::AlreadyCompleted`] from the order
    ///
    /// Neither the courier nor the order is modified on error.
    pub fn complete_order(&mut self, order: &mut Order) -> Result<OrderPlacement, DomainError> {
        let index = self
            .storage_places
            .iter()
            .position(|place| place.holds(order.id()))
            .ok_or(DomainError::OrderStorageNotFound)?;
        order.check_completable()?;

        let place = &mut self.storage_places[index];
        place.clear(order.id())?;
        order.complete()?;

        Ok(OrderPlacement {
            courier_id: self.id,
            order_id: order.id(),
            storage_place_id: place.id(),
        })
    }

    /// Estimated ticks to reach `target`: Manhattan distance over speed.
    ///
    /// Only meaningful for ranking couriers against each other.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if `target` is empty.
    pub fn calculate_time_to_location(&self, target: Location) -> Result<f64, DomainError> {
        if target.is_empty() {
            return Err(DomainError::Required("target"));
        }
        let distance = self.location.distance_to(&target)?;
        Ok(f64::from(distance) / f64::from(self.speed))
    }

    /// Advances one tick towards `target`.
    ///
    /// The courier spends at most `speed` cells: first along x, then whatever
    /// budget is left along y. Diagonal targets are therefore approached in an
    /// L shape, consistent with the Manhattan estimate used for ranking.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if `target` is empty.
    pub fn move_towards(&mut self, target: Location) -> Result<(), DomainError> {
        if target.is_empty() {
            return Err(DomainError::Required("target"));
        }

        let mut budget = i64::from(self.speed);

        let mut dx = i64::from(target.x()) - i64::from(self.location.x());
        if dx.abs() > budget {
            dx = budget * dx.signum();
        }
        budget -= dx.abs();

        let mut dy = i64::from(target.y()) - i64::from(self.location.y());
        if dy.abs() > budget {
            dy = budget * dy.signum();
        }

        let x = coordinate("x", i64::from(self.location.x()) + dx)?;
        let y = coordinate("y", i64::from(self.location.y()) + dy)?;
        self.location = Location::new(x, y)?;
        Ok(())
    }

    /// A courier is free when none of its storage places holds an order.
    pub fn is_free(&self) -> bool {
        !self.storage_places.iter().any(StoragePlace::is_occupied)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn storage_places(&self) -> &[StoragePlace] {
        &self.storage_places
    }

    fn first_fit(&self, volume: i32) -> Result<Option<usize>, DomainError> {
        for (index, place) in self.storage_places.iter().enumerate() {
            if place.can_store(volume)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

impl PartialEq for Courier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Courier {}

fn coordinate(field: &'static str, value: i64) -> Result<u8, DomainError> {
    u8::try_from(value).map_err(|_| DomainError::OutOfRange {
        field,
        value,
        min: i64::from(Location::MIN_COORDINATE),
        max: i64::from(Location::MAX_COORDINATE),
    })
}
