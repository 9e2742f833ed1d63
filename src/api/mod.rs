//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into application commands and queries. Domain
//! and application errors become HTTP statuses only here, via
//! [`crate::error::AppError`]'s `IntoResponse`.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request tracing
//! - [`routes`] - Route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
