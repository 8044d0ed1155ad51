//! JSON fixture loader.

use std::path::PathBuf;

use serde_json::Value;

/// Loads JSON fixtures relative to the crate under test.
///
/// # Example
/// ```no_run
/// use agriguru_testing::fixture::Fixture;
/// let val = Fixture::load("tests/fixtures/contract_application.json");
/// ```
pub struct Fixture;

impl Fixture {
    /// Load and parse `CARGO_MANIFEST_DIR/relative_path`.
    ///
    /// Panics if the file is missing or invalid JSON.
    pub fn load(relative_path: &str) -> Value {
        let root = std::env::var("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap());
        let full_path = root.join(relative_path);
        let contents = std::fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("fixture not found at {}: {}", full_path.display(), e));
        serde_json::from_str(&contents)
            .unwrap_or_else(|e| panic!("invalid JSON in fixture {}: {}", relative_path, e))
    }
}
