//! Shared HTTP plumbing for AgriGuru services.
//!
//! Error envelope, health probes, request-id/trace layers, tracing setup and
//! environment configuration.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
