//! Configuration management for descriptor storage.
//!
//! Loads configuration from TOML file with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per backed-up package
    #[serde(default = "default_backups_dir")]
    pub backups_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_backups_dir() -> PathBuf {
    PathBuf::from("/data/backups")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backups_dir: default_backups_dir(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Default configuration with `.env` and process environment overrides
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `BACKUPS_DIR` and `LOG_LEVEL` from the given lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("BACKUPS_DIR").filter(|v| !v.is_empty()) {
            self.storage.backups_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.log.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backups_dir, PathBuf::from("/data/backups"));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_file_with_partial_sections() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[storage]\nbackups_dir = \"/srv/app-backups\"")?;

        let config = Config::from_file(file.path())?;
        assert_eq!(config.storage.backups_dir, PathBuf::from("/srv/app-backups"));
        assert_eq!(config.log.level, "info");
        Ok(())
    }

    #[test]
    fn test_from_file_rejects_bad_toml() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[storage\nbackups_dir = 3")?;
        assert!(Config::from_file(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "BACKUPS_DIR" => Some("/tmp/backups".to_string()),
            "LOG_LEVEL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.storage.backups_dir, PathBuf::from("/tmp/backups"));
        assert_eq!(config.log.level, "info");
    }
}
