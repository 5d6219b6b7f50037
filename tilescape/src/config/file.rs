//! Loading and saving `~/.tilescape/layers.ini`.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::{debug, info};

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("No layer named '{0}' is configured")]
    UnknownLayer(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load from the default path. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let config = super::parser::parse_ini(&ini)?;
        info!(path = %path.display(), layers = config.layers.len(), "loaded configuration");
        Ok(config)
    }

    /// Parse INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        super::parser::parse_ini(&ini)
    }

    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Write the defaults to the default path unless a file exists there.
    /// Returns the path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// `~/.tilescape`.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilescape")
}

/// `~/.tilescape/layers.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join("layers.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerSettings;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join("missing.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("layers.ini");

        let mut config = ConfigFile::default();
        config.cache.capacity = 128;
        let mut osm = LayerSettings::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png");
        osm.max_zoom = Some(19);
        config.layers.push(osm);
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.ini");
        std::fs::write(&path, "[cache\ncapacity = 3\n").unwrap();
        assert!(matches!(ConfigFile::load_from(&path), Err(ConfigFileError::ReadError(_))));
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".tilescape/layers.ini"));
    }
}
