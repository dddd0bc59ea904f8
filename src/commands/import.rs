//! Legacy import command

use crate::config::Config;
use crate::error::Result;
use crate::import::{import_legacy, read_legacy_entries, ImportStats};
use crate::store::VideoStore;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::info;

/// Import a legacy `videos.json` dump; `-` reads standard input
pub async fn cmd_import(config: &Config, store: &VideoStore, source: &Path) -> Result<ImportStats> {
    let entries = if source == Path::new("-") {
        info!("Reading legacy entries from stdin");
        read_legacy_entries(io::stdin().lock())?
    } else {
        info!("Reading legacy entries from {:?}", source);
        read_legacy_entries(BufReader::new(File::open(source)?))?
    };

    import_legacy(store, &config.import, entries).await
}

pub fn print_import_stats(stats: &ImportStats) {
    println!("\n📥 Import Complete\n");
    println!("Entries: {}", stats.total);
    println!("  Imported: {}", stats.imported);
    println!("  Skipped (id already present): {}", stats.skipped);
    println!("  Failed: {}", stats.failed);

    if !stats.errors.is_empty() {
        println!("\nErrors:");
        for error in &stats.errors {
            println!("  ✗ {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListOrder;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_import_from_file() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        let store = VideoStore::open(&config.paths.db_file).await.unwrap();

        let dump = tmp.path().join("videos.json");
        std::fs::write(
            &dump,
            r#"[
                {"id": 1, "title": "Kilter 40", "tags": "board, kilter", "videoUrl": "a.mp4", "status": "completed"},
                {"id": 2, "tags": ["slab"], "user_id": "u1"}
            ]"#,
        )
        .unwrap();

        let stats = cmd_import(&config, &store, &dump).await.unwrap();
        assert_eq!(stats.imported, 2);
        assert_eq!(stats.failed, 0);

        let untitled = store.get(2).await.unwrap();
        assert_eq!(untitled.title, "Untitled");
        assert_eq!(
            store.list_by_owner("u1", ListOrder::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        let store = VideoStore::open(&config.paths.db_file).await.unwrap();

        let result = cmd_import(&config, &store, &tmp.path().join("nope.json")).await;
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }
}
