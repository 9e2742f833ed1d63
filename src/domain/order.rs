//! Order aggregate and its status state machine.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::kernel::Location;

/// Lifecycle of an order. Transitions only move forward, one step at a time:
/// `Created -> Assigned -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Created,
    Assigned,
    Completed,
}

impl OrderStatus {
    /// Lowercase name used in storage and in API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "assigned" => Ok(Self::Assigned),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::InvalidArgument("unknown order status")),
        }
    }
}

/// A delivery order.
///
/// The id comes from upstream (the basket that was confirmed), so it is
/// supplied by the caller rather than generated. `courier_id` is set exactly
/// when the status is `Assigned` or `Completed`.
#[derive(Debug, Clone)]
pub struct Order {
    id: Uuid,
    courier_id: Option<Uuid>,
    location: Location,
    volume: i32,
    status: OrderStatus,
}

impl Order {
    /// Creates a new order in `Created` status.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if `id` is nil, `location` is empty,
    /// or `volume` is not positive.
    pub fn new(id: Uuid, location: Location, volume: i32) -> Result<Self, DomainError> {
        if id.is_nil() {
            return Err(DomainError::Required("order_id"));
        }
        if location.is_empty() {
            return Err(DomainError::Required("location"));
        }
        if volume <= 0 {
            return Err(DomainError::Required("volume"));
        }

        Ok(Self {
            id,
            courier_id: None,
            location,
            volume,
            status: OrderStatus::Created,
        })
    }

    /// Rebuilds an order from persisted state without validation.
    ///
    /// Persistence adapters only. Domain code goes through [`Order::new`].
    pub(crate) fn restore(
        id: Uuid,
        courier_id: Option<Uuid>,
        location: Location,
        volume: i32,
        status: OrderStatus,
    ) -> Self {
        Self {
            id,
            courier_id,
            location,
            volume,
            status,
        }
    }

    /// Assigns the order to a courier.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Required`] if `courier_id` is nil
    /// - [`DomainError::AlreadyAssigned`] unless the order is `Created`
    pub fn assign(&mut self, courier_id: Uuid) -> Result<(), DomainError> {
        self.check_assignable(courier_id)?;
        self.courier_id = Some(courier_id);
        self.status = OrderStatus::Assigned;
        Ok(())
    }

    /// Marks an assigned order as delivered.
    ///
    /// Re-completing is rejected rather than ignored.
    ///
    /// # Errors
    ///
    /// - [`DomainError::AlreadyCompleted`] if the order is already completed
    /// - [`DomainError::NotAssigned`] if the order was never assigned
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.check_completable()?;
        self.status = OrderStatus::Completed;
        Ok(())
    }

    pub(crate) fn check_assignable(&self, courier_id: Uuid) -> Result<(), DomainError> {
        if courier_id.is_nil() {
            return Err(DomainError::Required("courier_id"));
        }
        if self.status != OrderStatus::Created {
            return Err(DomainError::AlreadyAssigned);
        }
        Ok(())
    }

    pub(crate) fn check_completable(&self) -> Result<(), DomainError> {
        match (self.status, self.courier_id) {
            (OrderStatus::Completed, _) => Err(DomainError::AlreadyCompleted),
            (OrderStatus::Assigned, Some(_)) => Ok(()),
            _ => Err(DomainError::NotAssigned),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn courier_id(&self) -> Option<Uuid> {
        self.courier_id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }
}

/// Orders are entities: two values are the same order when their ids match.
impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Order {}
