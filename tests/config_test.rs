//! Integration tests for Settings config loading with layered precedence.
//!
//! These tests run without a global config (temp directories only), so they
//! exercise compiled defaults overlaid by a local `.tonnage.toml`.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use tonnage::application::ApplicationError;
use tonnage::config::{local_config_path, Settings};
use tonnage::domain::UNKNOWN_DRIVER_LABEL;

#[test]
fn given_empty_project_dir_when_load_then_returns_defaults() {
    let project = TempDir::new().unwrap();

    let settings = Settings::load(Some(project.path())).expect("load settings");

    assert_eq!(settings.graph.base_size, 90.0);
    assert_eq!(settings.graph.min_size, 50.0);
    assert_eq!(settings.graph.max_size, 160.0);
    assert_eq!(settings.drivers.unknown_label, UNKNOWN_DRIVER_LABEL);
}

#[test]
fn given_local_config_when_load_then_overrides_only_given_keys() {
    // Arrange
    let project = TempDir::new().unwrap();
    let local = r#"
snapshot = "data/campaign.json"

[graph]
max_size = 200.0

[drivers]
unknown_label = "Chauffeur inconnu"
"#;
    fs::write(local_config_path(project.path()), local).unwrap();

    // Act
    let settings = Settings::load(Some(project.path())).expect("load settings");

    // Assert: relative snapshot resolved against the project dir
    assert_eq!(
        settings.snapshot,
        Some(project.path().join("data/campaign.json"))
    );
    assert_eq!(settings.graph.max_size, 200.0);
    assert_eq!(settings.graph.min_size, 50.0);
    assert_eq!(settings.drivers.unknown_label, "Chauffeur inconnu");
}

#[test]
fn given_absolute_snapshot_when_load_then_keeps_it() {
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        "snapshot = \"/srv/campaign/snapshot.json\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(project.path())).expect("load settings");

    assert_eq!(
        settings.snapshot,
        Some(PathBuf::from("/srv/campaign/snapshot.json"))
    );
}

#[test]
fn given_inverted_size_bounds_when_load_then_fails_with_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        "[graph]\nmin_size = 300.0\n",
    )
    .unwrap();

    let result = Settings::load(Some(project.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_toml_when_load_then_fails_with_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "[graph\nbase_size = ").unwrap();

    let result = Settings::load(Some(project.path()));

    assert!(matches!(result, Err(ApplicationError::Config { message }) if message.contains(".tonnage.toml")));
}

#[test]
fn given_loaded_settings_when_rendering_toml_then_round_trips() {
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        "[graph]\nbase_size = 120.0\n",
    )
    .unwrap();
    let settings = Settings::load(Some(project.path())).unwrap();

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
}
