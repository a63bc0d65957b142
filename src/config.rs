//! Journal configuration
//!
//! TOML file, usually `journal.toml` inside the data directory:
//!
//! ```toml
//! data_dir = "/home/me/journal"
//! load_policy = "lenient"
//! lock_appends = false
//! default_top_n = 5
//! correlation_bucket_minutes = 0
//! ```

use crate::error::JournalError;
use crate::reader::LoadPolicy;
use crate::views::Alignment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the data directory when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "journal.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Directory holding the stream files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// How malformed rows are handled on load
    #[serde(default)]
    pub load_policy: LoadPolicy,

    /// Take an exclusive advisory lock around each append
    #[serde(default)]
    pub lock_appends: bool,

    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Width of the correlation join window; 0 joins on exact timestamps
    #[serde(default)]
    pub correlation_bucket_minutes: u32,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            load_policy: LoadPolicy::default(),
            lock_appends: false,
            default_top_n: default_top_n(),
            correlation_bucket_minutes: 0,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_top_n() -> usize {
    5
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> JournalError {
    JournalError::Config(format!("Failed to parse {}: {}", path.display(), e))
}

impl JournalConfig {
    /// Load configuration from file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, JournalError> {
        if !path.exists() {
            tracing::info!("Config file not found, using defaults: {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: JournalConfig = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load `journal.toml` from a data directory, keeping that directory as
    /// `data_dir` unless the file names another one
    pub fn load_from_dir(data_dir: &Path) -> Result<Self, JournalError> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self {
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let document: toml::Table = toml::from_str(&content).map_err(|e| parse_error(&path, e))?;
        let names_data_dir = document.contains_key("data_dir");
        let mut config: JournalConfig = toml::Value::Table(document)
            .try_into()
            .map_err(|e| parse_error(&path, e))?;
        if !names_data_dir {
            config.data_dir = data_dir.to_path_buf();
        }
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), JournalError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| JournalError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), JournalError> {
        if self.default_top_n == 0 {
            return Err(JournalError::Config(
                "default_top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Correlation alignment selected by `correlation_bucket_minutes`
    pub fn alignment(&self) -> Alignment {
        match self.correlation_bucket_minutes {
            0 => Alignment::Exact,
            minutes => Alignment::Bucket {
                width_seconds: i64::from(minutes) * 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = JournalConfig::default();
        assert_eq!(config.load_policy, LoadPolicy::Lenient);
        assert!(!config.lock_appends);
        assert_eq!(config.default_top_n, 5);
        assert_eq!(config.alignment(), Alignment::Exact);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = JournalConfig {
            load_policy: LoadPolicy::Strict,
            correlation_bucket_minutes: 30,
            ..JournalConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = JournalConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.alignment(), Alignment::Bucket { width_seconds: 1800 });
    }

    #[test]
    fn test_load_from_dir_keeps_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = JournalConfig::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(config.data_dir, temp_dir.path());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "lock_appends = true\n",
        )
        .unwrap();
        let config = JournalConfig::load_from_dir(temp_dir.path()).unwrap();
        assert!(config.lock_appends);
        assert_eq!(config.data_dir, temp_dir.path());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "data_dir = \"/srv/journal\"\ncorrelation_bucket_minutes = 15\n",
        )
        .unwrap();
        let config = JournalConfig::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/journal"));
        assert_eq!(config.alignment(), Alignment::Bucket { width_seconds: 900 });
    }

    #[test]
    fn test_load_from_dir_rejects_bad_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "default_top_n = \"many\"\n").unwrap();
        let err = JournalConfig::load_from_dir(temp_dir.path()).unwrap_err();
        assert!(matches!(err, JournalError::Config(ref msg) if msg.contains("journal.toml")));

        std::fs::write(&path, "default_top_n = 0\n").unwrap();
        assert!(matches!(
            JournalConfig::load_from_dir(temp_dir.path()),
            Err(JournalError::Config(_))
        ));

        std::fs::write(&path, "lock_appends = [\n").unwrap();
        assert!(matches!(
            JournalConfig::load_from_dir(temp_dir.path()),
            Err(JournalError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_policy_and_zero_top_n() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "load_policy = \"forgiving\"\n").unwrap();
        assert!(matches!(
            JournalConfig::load(&path),
            Err(JournalError::Config(_))
        ));

        std::fs::write(&path, "default_top_n = 0\n").unwrap();
        assert!(matches!(
            JournalConfig::load(&path),
            Err(JournalError::Config(_))
        ));
    }
}
