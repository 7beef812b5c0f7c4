//! Environment overrides for Settings.
//!
//! Kept in its own test binary: it mutates the process environment.

use std::env;

use tempfile::TempDir;

use tonnage::config::{local_config_path, Settings};

#[test]
fn given_env_vars_when_load_then_override_local_config() {
    // Arrange
    let project = TempDir::new().unwrap();
    std::fs::write(
        local_config_path(project.path()),
        "[graph]\nbase_size = 120.0\n\n[drivers]\nunknown_label = \"Local\"\n",
    )
    .unwrap();
    env::set_var("TONNAGE_GRAPH__BASE_SIZE", "100");
    env::set_var("TONNAGE_DRIVERS__UNKNOWN_LABEL", "From env");

    // Act
    let result = Settings::load(Some(project.path()));
    env::remove_var("TONNAGE_GRAPH__BASE_SIZE");
    env::remove_var("TONNAGE_DRIVERS__UNKNOWN_LABEL");

    // Assert
    let settings = result.expect("load settings");
    assert_eq!(settings.graph.base_size, 100.0);
    assert_eq!(settings.drivers.unknown_label, "From env");
}
