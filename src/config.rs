//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tonnage/tonnage.toml`
//! 3. Local config: `<project_dir>/.tonnage.toml`
//! 4. Environment variables: `TONNAGE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{SizeScale, UNKNOWN_DRIVER_LABEL};

/// Network graph node sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Size of a node whose target equals its level's average
    pub base_size: f64,
    /// Floor for node size
    pub min_size: f64,
    /// Ceiling for node size
    pub max_size: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        let scale = SizeScale::default();
        Self {
            base_size: scale.base,
            min_size: scale.min,
            max_size: scale.max,
        }
    }
}

impl GraphConfig {
    pub fn scale(&self) -> SizeScale {
        SizeScale {
            base: self.base_size,
            min: self.min_size,
            max: self.max_size,
        }
    }
}

/// Driver roll-up settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DriversConfig {
    /// Display name of the bucket collecting deliveries without a driver
    pub unknown_label: String,
}

impl Default for DriversConfig {
    fn default() -> Self {
        Self {
            unknown_label: UNKNOWN_DRIVER_LABEL.to_string(),
        }
    }
}

/// Raw graph config for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawGraphConfig {
    pub base_size: Option<f64>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDriversConfig {
    pub unknown_label: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub snapshot: Option<PathBuf>,
    pub graph: RawGraphConfig,
    pub drivers: RawDriversConfig,
}

/// Unified configuration for tonnage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Default snapshot file when none is given on the command line
    pub snapshot: Option<PathBuf>,
    pub graph: GraphConfig,
    pub drivers: DriversConfig,
}

/// Get the XDG config directory for tonnage.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tonnage").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tonnage.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".tonnage.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Overlay wins where it specifies a value.
    ///
    /// A relative `snapshot` in a config file is resolved against `base`.
    fn merge_with(&self, overlay: &RawSettings, base: Option<&Path>) -> Self {
        let snapshot = overlay
            .snapshot
            .as_ref()
            .map(|p| match base {
                Some(dir) if p.is_relative() && !p.to_string_lossy().starts_with(['~', '$']) => {
                    dir.join(p)
                }
                _ => p.clone(),
            })
            .or_else(|| self.snapshot.clone());
        Self {
            snapshot,
            graph: GraphConfig {
                base_size: overlay.graph.base_size.unwrap_or(self.graph.base_size),
                min_size: overlay.graph.min_size.unwrap_or(self.graph.min_size),
                max_size: overlay.graph.max_size.unwrap_or(self.graph.max_size),
            },
            drivers: DriversConfig {
                unknown_label: overlay
                    .drivers
                    .unknown_label
                    .clone()
                    .unwrap_or_else(|| self.drivers.unknown_label.clone()),
            },
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            let expanded = expand_env_vars(snapshot.to_string_lossy().as_ref());
            self.snapshot = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.tonnage.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw, global_path.parent());
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw, Some(dir));
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply TONNAGE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TONNAGE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("snapshot") {
            settings.snapshot = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_float("graph.base_size") {
            settings.graph.base_size = val;
        }
        if let Ok(val) = config.get_float("graph.min_size") {
            settings.graph.min_size = val;
        }
        if let Ok(val) = config.get_float("graph.max_size") {
            settings.graph.max_size = val;
        }
        if let Ok(val) = config.get_string("drivers.unknown_label") {
            settings.drivers.unknown_label = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        let g = &self.graph;
        if !(g.base_size.is_finite() && g.min_size.is_finite() && g.max_size.is_finite()) {
            return Err(ApplicationError::Config {
                message: "graph sizes must be finite numbers".into(),
            });
        }
        if g.min_size > g.max_size {
            return Err(ApplicationError::Config {
                message: format!(
                    "graph.min_size ({}) exceeds graph.max_size ({})",
                    g.min_size, g.max_size
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tonnage configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tonnage/tonnage.toml
#   Local:  <project_dir>/.tonnage.toml
#   Env:    TONNAGE_* environment variables (e.g. TONNAGE_GRAPH__BASE_SIZE=120)

# Snapshot used when no file is given on the command line
# snapshot = "~/campaign/snapshot.json"

[graph]
# Node size at the level's average target
# base_size = 90.0
# min_size = 50.0
# max_size = 160.0

[drivers]
# Label of the bucket for deliveries without a driver
# unknown_label = "Unknown driver"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.graph.scale(), SizeScale::default());
        assert_eq!(settings.drivers.unknown_label, UNKNOWN_DRIVER_LABEL);
        assert!(settings.snapshot.is_none());
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            snapshot: Some(PathBuf::from("data/snapshot.json")),
            graph: RawGraphConfig {
                base_size: Some(120.0),
                ..Default::default()
            },
            drivers: RawDriversConfig::default(),
        };

        let result = base.merge_with(&overlay, Some(Path::new("/campaign")));

        assert_eq!(result.graph.base_size, 120.0);
        assert_eq!(result.graph.min_size, 50.0);
        assert_eq!(result.graph.max_size, 160.0);
        assert_eq!(result.drivers.unknown_label, UNKNOWN_DRIVER_LABEL);
        assert_eq!(
            result.snapshot,
            Some(PathBuf::from("/campaign/data/snapshot.json"))
        );
    }

    #[test]
    fn given_tilde_in_snapshot_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            snapshot: Some(PathBuf::from("~/campaign.json")),
            ..Default::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let snapshot = settings.snapshot.unwrap();
        assert!(snapshot.to_string_lossy().starts_with(&home));
    }

    #[test]
    fn given_inverted_bounds_when_validating_then_fails() {
        let mut settings = Settings::default();
        settings.graph.min_size = 200.0;

        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.snapshot.is_none());
        assert!(raw.graph.base_size.is_none());
    }
}
