//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::store::{StoreStats, VideoStore};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub default_owner: Option<String>,
    pub stats: StoreStats,
}

/// Get journal status
pub async fn cmd_status(config: &Config, store: &VideoStore) -> Result<StatusInfo> {
    info!("Getting status");

    let stats = store.stats().await?;

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        default_owner: config.default_owner.clone(),
        stats,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 climblog Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!(
        "Default owner: {}",
        status.default_owner.as_deref().unwrap_or("(none)")
    );
    println!("\nVideos: {}", status.stats.video_count);
    println!("  Ready: {}", status.stats.ready);
    println!("  Processing: {}", status.stats.processing);
    println!("  Failed: {}", status.stats.failed);
    println!("\nOwners: {}", status.stats.owner_count);
    println!("Tags: {}", status.stats.tag_count);
}
