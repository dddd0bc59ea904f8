//! Init command implementation

use crate::config::{render_config_toml, Config};
use crate::error::{Error, Result};
use crate::store::VideoStore;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub force: bool,
    /// Owner written into the new config
    pub owner: Option<String>,
}

/// Write a fresh config file and create the journal database
pub async fn cmd_init(options: InitOptions) -> Result<Config> {
    let InitOptions {
        base_dir,
        config_path,
        force,
        owner,
    } = options;

    if config_path.exists() && !force {
        return Err(Error::AlreadyInitialized(config_path.display().to_string()));
    }

    let mut config = Config::default();
    config.init_paths(Some(base_dir));
    config.paths.config_file = config_path.clone();
    if owner.is_some() {
        config.default_owner = owner;
    }
    config.validate()?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config_path, render_config_toml(config.default_owner.as_deref()))?;
    info!("Created config at {:?}", config_path);

    let store = VideoStore::connect(&config).await?;
    store.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    Ok(config)
}

/// Print the post-init summary
pub fn print_init_summary(config: &Config) {
    println!("✓ Initialized climblog at {:?}", config.paths.base_dir);
    println!("\nConfiguration: {:?}", config.paths.config_file);
    println!("Database: {:?}", config.paths.db_file);
    match &config.default_owner {
        Some(owner) => println!("Default owner: {}", owner),
        None => println!("Default owner: (none, pass --owner when adding videos)"),
    }
    println!("\nNext steps:");
    println!("  climblog add \"Blue roof V5\" --grade 5 --tag roof   # Log a video");
    println!("  climblog import videos.json                      # Bring in the old journal");
    println!("  climblog list --tag roof                         # Browse by tag");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(tmp: &TempDir, force: bool) -> InitOptions {
        InitOptions {
            base_dir: tmp.path().to_path_buf(),
            config_path: tmp.path().join("config.toml"),
            force,
            owner: Some("u1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_init_creates_config_and_db() {
        let tmp = TempDir::new().unwrap();
        let config = cmd_init(options(&tmp, false)).await.unwrap();

        assert!(config.is_initialized());
        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.default_owner.as_deref(), Some("u1"));

        let store = VideoStore::connect(&loaded).await.unwrap();
        assert!(store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        cmd_init(options(&tmp, false)).await.unwrap();

        let again = cmd_init(options(&tmp, false)).await;
        assert!(matches!(again, Err(Error::AlreadyInitialized(_))));

        assert!(cmd_init(options(&tmp, true)).await.is_ok());
    }
}
