//! Configuration file support for medtrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medtrack/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub roster: RosterConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Home screen roster display
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Entries shown per day before the list is collapsed
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            preview_limit: default_preview_limit(),
        }
    }
}

/// Deletion log retention
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Deleted medicines older than this many days are pruned. 0 keeps all.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
        }
    }
}

/// Reminder defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether newly added medicines have reminders switched on
    #[serde(default = "default_enabled_by_default")]
    pub enabled_by_default: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: default_enabled_by_default(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("medtrack")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_preview_limit() -> usize {
    5
}

fn default_max_age_days() -> u32 {
    365
}

fn default_enabled_by_default() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("medtrack").join("config.toml")
    }

    /// Directory holding the key-value store files
    pub fn store_dir(&self) -> PathBuf {
        self.data.data_dir.join("store")
    }

    fn validate(&self) -> Result<()> {
        if self.roster.preview_limit == 0 {
            return Err(Error::Config(
                "roster.preview_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.roster.preview_limit, 5);
        assert_eq!(config.retention.max_age_days, 365);
        assert!(config.notifications.enabled_by_default);
        assert!(config.data.data_dir.ends_with("medtrack"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.retention.max_age_days = 30;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.retention.max_age_days, 30);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[roster]
preview_limit = 8
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.roster.preview_limit, 8);
        assert_eq!(config.retention.max_age_days, 365); // default
    }

    #[test]
    fn test_zero_preview_limit_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[roster]\npreview_limit = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
