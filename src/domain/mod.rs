//! Domain layer: aggregates, value objects and domain services.
//!
//! Nothing here depends on storage or transport. Aggregates are loaded fresh
//! for every use case, mutated only through their own methods and handed
//! back to repositories for persistence.
//!
//! # Architecture
//!
//! - [`kernel`] - [`kernel::Location`] value object
//! - [`order`] - Order aggregate and its status state machine
//! - [`courier`] - Courier aggregate with storage places
//! - [`services`] - [`services::OrderDispatcher`]
//! - [`repositories`] - Persistence ports and the unit of work
//! - [`geo`] - Geolocation port
//! - [`errors`] - [`errors::DomainError`]

pub mod courier;
pub mod errors;
pub mod geo;
pub mod kernel;
pub mod order;
pub mod repositories;
pub mod services;
