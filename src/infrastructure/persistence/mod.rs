//! Storage backends implementing the domain ports.
//!
//! # Backends
//!
//! - [`postgres`] - PostgreSQL via SQLx, the production backend
//! - [`memory`] - In-process store for local runs and tests

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PgReadModel, PgUnitOfWorkFactory};
