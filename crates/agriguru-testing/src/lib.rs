//! Test utilities for AgriGuru services.
//!
//! Import in tests only, never in production code.

pub mod fixture;
