use super::app_config::AppConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform config directory.
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Config could not be serialized.
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Reads and writes one configuration file.
#[derive(Debug, Clone)]
pub struct StorageManager {
    config_path: PathBuf,
}

impl StorageManager {
    /// Uses the platform config file location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        AppConfig::default_config_path()
            .map(Self::at)
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Uses an explicit config file.
    #[must_use]
    pub const fn at(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Config file this manager reads and writes.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the configuration. A missing file is created with defaults; a
    /// malformed one is left untouched and defaults are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the default cannot be written.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_path.exists() {
            info!(path = %self.config_path.display(), "No config file, writing defaults");
            let config = AppConfig::default();
            self.save_config(&config)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.config_path.display(), error = %e, "Invalid config file, using defaults");
            AppConfig::default()
        }))
    }

    /// Writes the configuration atomically, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config)?;
        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| std::io::Error::other("config path has no parent directory"))?;
        fs::create_dir_all(dir)?;

        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(content.as_bytes())?;
        staged.persist(&self.config_path).map_err(|e| e.error)?;

        debug!(path = %self.config_path.display(), "Saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let storage = StorageManager::at(path.clone());

        let config = storage.load_config().unwrap();
        assert!(config.cache.clear_cache_on_disable);
        assert!(path.exists());

        let reloaded = storage.load_config().unwrap();
        assert_eq!(reloaded.network.timeout_secs, config.network.timeout_secs);
    }

    #[test]
    fn test_malformed_file_falls_back_without_overwriting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "invalid_toml = [").unwrap();

        let config = StorageManager::at(path.clone()).load_config().unwrap();

        assert!(config.subscribed_mods.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "invalid_toml = [");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::at(dir.path().join("config.toml"));

        let mut config = AppConfig::default();
        config.subscribed_mods = vec![7, 9];
        config.cache.memory_capacity = Some(64);
        storage.save_config(&config).unwrap();

        let loaded = storage.load_config().unwrap();
        assert_eq!(loaded.subscribed_mods, vec![7, 9]);
        assert_eq!(loaded.cache.memory_capacity, Some(64));
        assert_eq!(storage.config_path().to_path_buf(), dir.path().join("config.toml"));
    }
}
