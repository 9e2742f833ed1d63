//! Grid coordinates as exposed over HTTP.

use serde::Serialize;

use crate::domain::kernel::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocationDto {
    pub x: u8,
    pub y: u8,
}

impl From<Location> for LocationDto {
    fn from(location: Location) -> Self {
        Self {
            x: location.x(),
            y: location.y(),
        }
    }
}
