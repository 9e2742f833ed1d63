//! Application layer: use cases built from domain operations.
//!
//! Handlers consume the domain ports (`UnitOfWorkFactory`, `ReadModel`,
//! `GeoLocator`) as trait objects and are shared between the HTTP API, the
//! periodic jobs and the admin CLI.
//!
//! # Commands
//!
//! - [`commands::AssignOrderHandler`] - Match the oldest waiting order with a courier
//! - [`commands::MoveCouriersHandler`] - Advance couriers and complete deliveries
//! - [`commands::CreateOrderHandler`] - Idempotent order intake
//! - [`commands::CreateCourierHandler`] - Courier onboarding
//!
//! # Queries
//!
//! - [`queries::GetCouriersHandler`]
//! - [`queries::GetOrdersHandler`]

pub mod commands;
pub mod queries;
