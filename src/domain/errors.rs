//! Business rule violations raised by the domain aggregates.

/// Error category used by outer layers to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, blank or out-of-range input. Rejected before any state change.
    Validation,
    /// An aggregate invariant blocks the requested transition.
    Conflict,
    /// No eligible counterpart exists for a matching operation.
    Unavailable,
}

/// Errors produced by [`crate::domain`] types.
///
/// Every variant leaves the aggregates it was raised on untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("value is required: {0}")]
    Required(&'static str),

    #[error("value {value} of '{field}' is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("cannot store order in this storage place")]
    CannotStore,

    #[error("order is not stored in this place")]
    NotStoredHere,

    #[error("courier has no storage place for this order")]
    NoStoragePlace,

    #[error("courier does not hold this order")]
    OrderStorageNotFound,

    #[error("order has already been assigned")]
    AlreadyAssigned,

    #[error("order has not been assigned")]
    NotAssigned,

    #[error("order has already been completed")]
    AlreadyCompleted,

    #[error("suitable courier not found")]
    SuitableCourierNotFound,
}

impl DomainError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Required(_) | Self::OutOfRange { .. } | Self::InvalidArgument(_) => {
                ErrorKind::Validation
            }
            Self::CannotStore
            | Self::NotStoredHere
            | Self::NoStoragePlace
            | Self::OrderStorageNotFound
            | Self::AlreadyAssigned
            | Self::NotAssigned
            | Self::AlreadyCompleted => ErrorKind::Conflict,
            Self::SuitableCourierNotFound => ErrorKind::Unavailable,
        }
    }

    /// Stable snake_case identifier, exposed in API error details.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Required(_) => "required",
            Self::OutOfRange { .. } => "out_of_range",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::CannotStore => "cannot_store",
            Self::NotStoredHere => "not_stored_here",
            Self::NoStoragePlace => "no_storage_place",
            Self::OrderStorageNotFound => "order_storage_not_found",
            Self::AlreadyAssigned => "already_assigned",
            Self::NotAssigned => "not_assigned",
            Self::AlreadyCompleted => "already_completed",
            Self::SuitableCourierNotFound => "suitable_courier_not_found",
        }
    }
}
