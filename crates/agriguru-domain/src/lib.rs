//! Domain types shared across AgriGuru crates.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod alert;
pub mod contract;
pub mod limit;
