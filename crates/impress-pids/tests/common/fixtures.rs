//! Test fixture loading utilities

use std::path::PathBuf;

use impress_pids::PidsConfig;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load and validate a configuration fixture
pub fn load_config(name: &str) -> PidsConfig {
    PidsConfig::load(&fixture_path(name))
        .unwrap_or_else(|e| panic!("Invalid config fixture {}: {}", name, e))
}
