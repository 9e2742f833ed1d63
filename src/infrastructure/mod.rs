//! Infrastructure layer for external integrations.
//!
//! Implements the ports defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL and in-memory storage backends
//! - [`geo`] - Geolocation service client and random fallback

pub mod geo;
pub mod persistence;
