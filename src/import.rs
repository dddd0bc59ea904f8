//! Import of the legacy `videos.json` journal dump
//!
//! The old journal kept every entry in one JSON array. Entries are loose:
//! `tags` may be a list or a comma-separated string, the media link is
//! spelled `videoUrl`, and finished videos are marked `"completed"`.
//! Entries that cannot be converted are reported and skipped; storage
//! failures stop the import.

use crate::config::ImportConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{NewVideo, VideoStatus};
use crate::progress::add_progress_bar;
use crate::store::{VideoStore, DATE_FORMAT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use tracing::{info, warn};

/// One entry of the legacy dump
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyVideo {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub climbed_date: Option<String>,
    pub grade: Option<i32>,
    pub climb_type: Option<String>,
    pub board_type: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(rename = "videoUrl", alias = "video_url")]
    pub video_url: Option<String>,
    pub tags: Option<LegacyTags>,
    pub user_id: Option<String>,
    pub status: Option<String>,
}

/// Tags as the legacy dump stores them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyTags {
    List(Vec<String>),
    Csv(String),
}

impl LegacyTags {
    /// Trimmed, non-blank tags
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            LegacyTags::List(tags) => tags,
            LegacyTags::Csv(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl LegacyVideo {
    /// Convert to store input, returning the id to keep if the entry had one
    pub fn into_new_video(self, settings: &ImportConfig) -> Result<(Option<i64>, NewVideo)> {
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| settings.default_title.clone());

        let climbed_date = self
            .climbed_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| {
                NaiveDate::parse_from_str(d, DATE_FORMAT).map_err(|e| {
                    Error::validation(format!("climbed_date '{}' is not YYYY-MM-DD: {}", d, e))
                })
            })
            .transpose()?;

        let status = legacy_status(self.status.as_deref(), settings.default_status)?;

        let input = NewVideo {
            title,
            climbed_date,
            grade: Some(self.grade.unwrap_or(0)),
            climb_type: self.climb_type,
            board_type: self.board_type,
            thumbnail: self.thumbnail,
            video_url: self.video_url,
            tags: self.tags.map(LegacyTags::into_tags).unwrap_or_default(),
            user_id: self.user_id.filter(|u| !u.trim().is_empty()),
            status: Some(status),
        };
        Ok((self.id, input))
    }
}

/// Map a legacy status string; `"completed"` is the old name for ready.
/// The old journal was not consistent about case or padding.
fn legacy_status(raw: Option<&str>, default: VideoStatus) -> Result<VideoStatus> {
    let normalized = raw.map(|s| s.trim().to_ascii_lowercase());
    match normalized.as_deref() {
        None | Some("") => Ok(default),
        Some("completed") => Ok(VideoStatus::Ready),
        Some(s) => s.parse(),
    }
}

/// Import outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    pub total: usize,
    pub imported: usize,
    /// Entries whose id already existed
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Read the legacy dump: a JSON array of entries
pub fn read_legacy_entries<R: Read>(reader: R) -> Result<Vec<Value>> {
    match serde_json::from_reader(reader)? {
        Value::Array(entries) => Ok(entries),
        other => Err(Error::validation(format!(
            "legacy dump must be a JSON array, found {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Insert legacy entries into the store
pub async fn import_legacy(
    store: &VideoStore,
    settings: &ImportConfig,
    entries: Vec<Value>,
) -> Result<ImportStats> {
    let mut stats = ImportStats {
        total: entries.len(),
        ..Default::default()
    };
    info!("Importing {} legacy entries", stats.total);

    let progress = add_progress_bar(entries.len() as u64, "Importing");

    for (index, entry) in entries.into_iter().enumerate() {
        let label = entry_label(index, &entry);
        let outcome = match serde_json::from_value::<LegacyVideo>(entry) {
            Ok(legacy) => match legacy.into_new_video(settings) {
                Ok((id, input)) => store.import_record(&input, id).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(Error::validation(e.to_string())),
        };

        match outcome {
            Ok(Some(_)) => stats.imported += 1,
            Ok(None) => {
                info!("Skipping {}: id already present", label);
                stats.skipped += 1;
            }
            Err(e) if e.kind() == ErrorKind::Validation => {
                warn!("Failed to import {}: {}", label, e);
                stats.failed += 1;
                stats.errors.push(format!("{}: {}", label, e));
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        "Import finished: {} imported, {} skipped, {} failed",
        stats.imported, stats.skipped, stats.failed
    );
    Ok(stats)
}

fn entry_label(index: usize, entry: &Value) -> String {
    match entry.get("id").and_then(Value::as_i64) {
        Some(id) => format!("entry #{} (id {})", index + 1, id),
        None => format!("entry #{}", index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListOrder;
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup_test_store() -> (VideoStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = VideoStore::open(&tmp.path().join("import.db")).await.unwrap();
        (store, tmp)
    }

    fn parse(value: Value) -> (Option<i64>, NewVideo) {
        serde_json::from_value::<LegacyVideo>(value)
            .unwrap()
            .into_new_video(&ImportConfig::default())
            .unwrap()
    }

    #[test]
    fn test_csv_tags_are_split_and_trimmed() {
        let (_, input) = parse(json!({ "title": "Roof", "tags": "roof, crimpy,, kilter " }));
        assert_eq!(input.tags, vec!["roof", "crimpy", "kilter"]);
    }

    #[test]
    fn test_list_tags_drop_blanks() {
        let (_, input) = parse(json!({ "title": "Slab", "tags": ["slab", " ", "balance"] }));
        assert_eq!(input.tags, vec!["slab", "balance"]);
    }

    #[test]
    fn test_field_mapping_and_defaults() {
        let (id, input) = parse(json!({
            "id": 12,
            "videoUrl": "https://cdn.example/12.mp4",
            "climbed_date": "2023-11-02",
            "status": " Completed"
        }));
        assert_eq!(id, Some(12));
        assert_eq!(input.title, "Untitled");
        assert_eq!(input.grade, Some(0));
        assert_eq!(input.video_url.as_deref(), Some("https://cdn.example/12.mp4"));
        assert_eq!(input.climbed_date, NaiveDate::from_ymd_opt(2023, 11, 2));
        assert_eq!(input.status, Some(VideoStatus::Ready));
        assert!(input.tags.is_empty());
    }

    #[test]
    fn test_missing_status_uses_configured_default() {
        let settings = ImportConfig {
            default_status: VideoStatus::Processing,
            ..Default::default()
        };
        let (_, input) = serde_json::from_value::<LegacyVideo>(json!({ "title": "x" }))
            .unwrap()
            .into_new_video(&settings)
            .unwrap();
        assert_eq!(input.status, Some(VideoStatus::Processing));
    }

    #[test]
    fn test_unknown_status_and_bad_date_fail() {
        let bad_status = serde_json::from_value::<LegacyVideo>(json!({ "status": "archived" }))
            .unwrap()
            .into_new_video(&ImportConfig::default());
        assert!(bad_status.is_err());

        let bad_date = serde_json::from_value::<LegacyVideo>(json!({ "climbed_date": "last week" }))
            .unwrap()
            .into_new_video(&ImportConfig::default());
        assert!(bad_date.is_err());
    }

    #[test]
    fn test_dump_must_be_array() {
        assert!(read_legacy_entries(r#"{"videos": []}"#.as_bytes()).is_err());
        assert_eq!(read_legacy_entries("[{}, {}]".as_bytes()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_counts_and_continues_past_bad_entries() {
        let (store, _tmp) = setup_test_store().await;

        let entries = vec![
            json!({ "id": 3, "title": "Kilter 40", "tags": "board,kilter", "user_id": "u1" }),
            json!({ "id": 5, "title": "Outdoor", "tags": ["rock"], "status": "FAILED" }),
            json!({ "id": 6, "grade": "V5" }),
            json!({ "id": 3, "title": "Same id again" }),
        ];
        let stats = import_legacy(&store, &ImportConfig::default(), entries)
            .await
            .unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.errors.len(), 1);

        let kilter = store.get(3).await.unwrap();
        assert_eq!(kilter.title, "Kilter 40");
        assert_eq!(kilter.status, VideoStatus::Ready);
        assert!(kilter.has_tag("kilter"));
        assert_eq!(
            store.list_by_tag("kilter", ListOrder::default()).await.unwrap().len(),
            1
        );
        assert_eq!(store.get(5).await.unwrap().status, VideoStatus::Failed);

        let fresh = store.create(&NewVideo::new("New upload")).await.unwrap();
        assert_eq!(fresh, 6);
    }

    #[tokio::test]
    async fn test_oversized_legacy_id_is_skipped_and_uploads_still_work() {
        let (store, _tmp) = setup_test_store().await;

        let entries = vec![
            json!({ "id": 9_223_372_036_854_775_807_i64, "title": "Runaway id" }),
            json!({ "id": 4, "title": "Normal" }),
        ];
        let stats = import_legacy(&store, &ImportConfig::default(), entries)
            .await
            .unwrap();
        assert_eq!(stats.imported, 1);
        assert_eq!(stats.failed, 1);

        let fresh = store.create(&NewVideo::new("New upload")).await.unwrap();
        assert_eq!(fresh, 5);
    }

    #[tokio::test]
    async fn test_reimport_skips_everything() {
        let (store, _tmp) = setup_test_store().await;
        let entries = vec![
            json!({ "id": 1, "title": "One" }),
            json!({ "id": 2, "title": "Two" }),
        ];

        import_legacy(&store, &ImportConfig::default(), entries.clone())
            .await
            .unwrap();
        let again = import_legacy(&store, &ImportConfig::default(), entries)
            .await
            .unwrap();

        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 2);
        assert_eq!(store.list_all(ListOrder::default()).await.unwrap().len(), 2);
    }
}
