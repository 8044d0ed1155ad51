//! Bounded list limits.

use serde::{Deserialize, Serialize};

/// Number of items a list endpoint returns, clamped to `1..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit(pub u64);

impl Limit {
    /// Resolve a client-requested limit: `default` when absent, clamped to `1..=max`.
    pub fn resolve(requested: Option<u64>, default: u64, max: u64) -> Self {
        Self(requested.unwrap_or(default).clamp(1, max))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}
