//! Repository trait definitions for the domain layer.
//!
//! These traits are the ports the application layer talks to. Concrete
//! implementations live in `crate::infrastructure::persistence`.
//!
//! # Available Ports
//!
//! - [`OrderRepository`] - Order aggregate persistence
//! - [`CourierRepository`] - Courier aggregate persistence, storage places included
//! - [`UnitOfWork`] / [`UnitOfWorkFactory`] - Atomic commits across both aggregates
//! - [`ReadModel`] - Listing projections
//!
//! # Testing
//!
//! Mock implementations are generated via `mockall` under `cfg(test)`.
//! The in-memory backend (`crate::infrastructure::persistence::memory`)
//! implements the full contract for end-to-end tests.

pub mod courier_repository;
pub mod order_repository;
pub mod read_model;
pub mod unit_of_work;

pub use courier_repository::CourierRepository;
pub use order_repository::OrderRepository;
pub use read_model::{CourierView, OrderView, ReadModel};
pub use unit_of_work::{AggregateRef, UnitOfWork, UnitOfWorkFactory};

#[cfg(test)]
pub use courier_repository::MockCourierRepository;
#[cfg(test)]
pub use order_repository::MockOrderRepository;
#[cfg(test)]
pub use read_model::MockReadModel;
