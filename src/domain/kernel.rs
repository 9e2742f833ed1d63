//! Shared value objects.

use rand::Rng;

use crate::domain::errors::DomainError;

/// A cell on the delivery grid.
///
/// Coordinates are in `[MIN_COORDINATE, MAX_COORDINATE]` on both axes. The
/// all-zero value is the "empty" sentinel for a location that has not been
/// geocoded yet; a location is never half set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    x: u8,
    y: u8,
}

impl Location {
    pub const MIN_COORDINATE: u8 = 1;
    pub const MAX_COORDINATE: u8 = 10;

    /// Creates a location, validating both coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::OutOfRange`] if `x` or `y` is outside the grid.
    pub fn new(x: u8, y: u8) -> Result<Self, DomainError> {
        check_coordinate("x", x)?;
        check_coordinate("y", y)?;
        Ok(Self { x, y })
    }

    /// The unset location.
    pub const fn empty() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Picks a uniformly random cell of the grid.
    pub fn random() -> Self {
        Self::random_with(&mut rand::rng())
    }

    /// Picks a random cell using the given generator.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.random_range(Self::MIN_COORDINATE..=Self::MAX_COORDINATE),
            y: rng.random_range(Self::MIN_COORDINATE..=Self::MAX_COORDINATE),
        }
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Manhattan distance to `other`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidArgument`] if either location is empty.
    pub fn distance_to(&self, other: &Location) -> Result<u8, DomainError> {
        if self.is_empty() {
            return Err(DomainError::InvalidArgument("source location is empty"));
        }
        if other.is_empty() {
            return Err(DomainError::InvalidArgument("target location is empty"));
        }

        Ok(self.x.abs_diff(other.x) + self.y.abs_diff(other.y))
    }
}

fn check_coordinate(field: &'static str, value: u8) -> Result<(), DomainError> {
    if !(Location::MIN_COORDINATE..=Location::MAX_COORDINATE).contains(&value) {
        return Err(DomainError::OutOfRange {
            field,
            value: i64::from(value),
            min: i64::from(Location::MIN_COORDINATE),
            max: i64::from(Location::MAX_COORDINATE),
        });
    }
    Ok(())
}
