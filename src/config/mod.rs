//! Configuration management for climblog
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::models::VideoStatus;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Owner recorded on videos added from the CLI
    #[serde(default = "default_owner", skip_serializing_if = "Option::is_none")]
    pub default_owner: Option<String>,

    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Legacy import settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the database lock, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Legacy `videos.json` import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Status for entries that carry none
    #[serde(default = "default_legacy_status")]
    pub default_status: VideoStatus,

    /// Title for entries that carry none
    #[serde(default = "default_legacy_title")]
    pub default_title: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for climblog data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
            database: DatabaseConfig::default(),
            import: ImportConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_status: default_legacy_status(),
            default_title: default_legacy_title(),
        }
    }
}

impl Config {
    /// Get the default base directory for climblog (~/.climblog)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".climblog")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("journal.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Set up paths based on config file location
        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("journal.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Check if climblog is initialized (config and DB exist)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists() && self.paths.db_file.exists()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.database.busy_timeout_ms == 0 {
            return Err(Error::Config(
                "database.busy_timeout_ms must be positive".to_string(),
            ));
        }

        if self.import.default_title.trim().is_empty() {
            return Err(Error::Config(
                "import.default_title must not be empty".to_string(),
            ));
        }

        if matches!(&self.default_owner, Some(owner) if owner.trim().is_empty()) {
            return Err(Error::Config(
                "default_owner must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.import.default_status, VideoStatus::Ready);
        assert_eq!(config.import.default_title, "Untitled");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.default_owner = Some("climber-1".to_string());
        config.database.max_connections = 2;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.default_owner.as_deref(), Some("climber-1"));
        assert_eq!(loaded.database.max_connections, 2);
        assert_eq!(loaded.paths.db_file, tmp.path().join("journal.db"));
    }

    #[test]
    fn test_rendered_template_parses() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, render_config_toml(Some("u1"))).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_owner.as_deref(), Some("u1"));
        assert_eq!(config.import.default_status, VideoStatus::Ready);
        assert_eq!(config.paths.db_file, tmp.path().join("journal.db"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[import]\ndefault_status = \"failed\"\n").unwrap();
        assert_eq!(config.import.default_status, VideoStatus::Failed);
        assert_eq!(config.import.default_title, "Untitled");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
        config.database.max_connections = 1;
        assert!(config.validate().is_ok());

        config.import.default_title = "  ".to_string();
        assert!(config.validate().is_err());
        config.import.default_title = "Untitled".to_string();

        config.default_owner = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_status_in_file_is_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[import]\ndefault_status = \"completed\"\n");
        assert!(result.is_err());
    }
}
