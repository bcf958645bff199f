//! Bridge configuration, read from a TOML file once per session.
//!
//! ```text
//! dirs::config_dir()/padbridge/config.toml ──► BridgeConfig ──► RemapProfile
//!                                                           ├─► FeatureFlags
//!                                                           ├─► CursorSettings
//!                                                           └─► PlacementSettings
//! ```
//!
//! Unknown layout or style strings fall back to the defaults with a warning.
//! A missing file yields the defaults.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::mapping::remap::{ControlStyle, ControllerLayout, RemapProfile};
use crate::screen::cursor::CursorSettings;

const APP_DIR: &str = "padbridge";
const CONFIG_FILE: &str = "config.toml";

/// Per-feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub virtual_cursor: bool,
    pub placement: bool,
    pub double_press_exit: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            virtual_cursor: true,
            placement: true,
            double_press_exit: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Ticks within which a second cancel leaves placement.
    pub double_press_window_ticks: u64,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            double_press_window_ticks: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    #[serde(deserialize_with = "lenient")]
    pub layout: ControllerLayout,
    #[serde(deserialize_with = "lenient")]
    pub style: ControlStyle,
    pub remapping_enabled: bool,
    pub features: FeatureFlags,
    pub cursor: CursorSettings,
    pub placement: PlacementSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            layout: ControllerLayout::default(),
            style: ControlStyle::default(),
            remapping_enabled: true,
            features: FeatureFlags::default(),
            cursor: CursorSettings::default(),
            placement: PlacementSettings::default(),
        }
    }
}

/// Parses a string field, falling back to the type's default on unknown
/// values instead of rejecting the whole file.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default + Display,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|e| {
        let fallback = T::default();
        warn!("{}, falling back to {}", e, fallback);
        fallback
    }))
}

impl BridgeConfig {
    /// `<config dir>/padbridge/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(path, &content)?;
        info!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Loads from the default location, or defaults on any error.
    pub fn load_or_default() -> Self {
        match Self::default_path().and_then(|path| Self::load(&path)) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn profile(&self) -> RemapProfile {
        RemapProfile {
            layout: self.layout,
            style: self.style,
            remapping_enabled: self.remapping_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::buttons::JoystickType;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
layout = "Secondary"
style = "StyleB"

[cursor]
stick = "Right"
max_speed = 20.0
"#,
        )
        .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.layout, ControllerLayout::Secondary);
        assert_eq!(config.style, ControlStyle::StyleB);
        assert!(config.remapping_enabled);
        assert_eq!(config.cursor.stick, JoystickType::Right);
        assert_eq!(config.cursor.max_speed, 20.0);
        assert_eq!(config.cursor.deadzone, CursorSettings::default().deadzone);
        assert_eq!(config.placement, PlacementSettings::default());
    }

    #[test]
    fn unknown_layout_and_style_fall_back() {
        let config = BridgeConfig::from_toml(
            Path::new("inline.toml"),
            "layout = \"Sideways\"\nstyle = \"Freestyle\"\nremapping_enabled = false\n",
        )
        .unwrap();
        assert_eq!(config.layout, ControllerLayout::Primary);
        assert_eq!(config.style, ControlStyle::StyleA);
        assert!(!config.profile().remapping_enabled);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "layout = [").unwrap();
        assert!(matches!(BridgeConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = BridgeConfig::default();
        config.layout = ControllerLayout::Tertiary;
        config.features.double_press_exit = false;
        config.placement.double_press_window_ticks = 12;

        config.save(&path).unwrap();
        assert_eq!(BridgeConfig::load(&path).unwrap(), config);
    }
}
