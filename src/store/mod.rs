//! Video record storage using SQLite
//!
//! One row per journal entry in `videos`, plus two lookup structures:
//! - an owner index on `videos(user_id, created_at)`
//! - an inverted tag index in `video_tags`, rewritten in the same
//!   transaction as the row it describes
//!
//! Every call is one transaction. Mutations that read a row before writing
//! it first claim the database write lock, so concurrent patches to the same
//! video are applied one after another against the latest committed state.

mod schema;

pub use schema::*;

use crate::config::{Config, DatabaseConfig};
use crate::error::{Error, Result};
use crate::models::{ListOrder, NewVideo, TagSet, Video, VideoFields, VideoPatch, VideoStatus};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::FromRow;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Column list shared across queries; `videos` is always aliased as `v`.
const COLUMNS: &str = "v.id, v.title, v.climbed_date, v.grade, v.climb_type, v.board_type, \
    v.thumbnail, v.video_url, v.tags, v.user_id, v.status, v.created_at";

/// Largest id an imported entry may keep; legacy ids were 32-bit serials
const MAX_IMPORTED_ID: i64 = i32::MAX as i64;

/// A `videos` row as stored
#[derive(Debug, FromRow)]
struct VideoRow {
    id: i64,
    title: String,
    climbed_date: Option<String>,
    grade: Option<i32>,
    climb_type: Option<String>,
    board_type: Option<String>,
    thumbnail: Option<String>,
    video_url: Option<String>,
    tags: String,
    user_id: Option<String>,
    status: String,
    created_at: String,
}

impl TryFrom<VideoRow> for Video {
    type Error = Error;

    fn try_from(row: VideoRow) -> Result<Self> {
        let id = row.id;
        let corrupt = |reason: String| Error::CorruptRecord { id, reason };

        let climbed_date = row
            .climbed_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT))
            .transpose()
            .map_err(|e| corrupt(format!("climbed_date: {}", e)))?;
        let status: VideoStatus = row
            .status
            .parse()
            .map_err(|_| corrupt(format!("unknown status '{}'", row.status)))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| corrupt(format!("created_at: {}", e)))?
            .with_timezone(&Utc);
        let tags: Vec<String> =
            serde_json::from_str(&row.tags).map_err(|e| corrupt(format!("tags: {}", e)))?;
        let tags = TagSet::parse(tags).map_err(|e| corrupt(e.to_string()))?;

        Ok(Video {
            id,
            title: row.title,
            climbed_date,
            grade: row.grade.unwrap_or(0),
            climb_type: row.climb_type,
            board_type: row.board_type,
            thumbnail: row.thumbnail,
            video_url: row.video_url,
            tags,
            user_id: row.user_id,
            status,
            created_at,
        })
    }
}

fn collect_videos(rows: Vec<VideoRow>) -> Result<Vec<Video>> {
    rows.into_iter().map(Video::try_from).collect()
}

/// Fixed-width RFC 3339 so text order matches time order
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Video store handle
#[derive(Clone)]
pub struct VideoStore {
    pool: SqlitePool,
}

impl VideoStore {
    /// Connect to the journal database named in the config
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::connect_with(&config.paths.db_file, &config.database).await
    }

    /// Open a database at a path with default settings, creating the schema if needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        let store = Self::connect_with(db_path, &DatabaseConfig::default()).await?;

        if !store.is_initialized().await? {
            store.init_schema().await?;
        }

        Ok(store)
    }

    async fn connect_with(db_path: &Path, settings: &DatabaseConfig) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
            .foreign_keys(true);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='videos'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Writes =====

    /// Create a video entry and return its id.
    ///
    /// Status defaults to processing, grade to 0 and tags to the empty set.
    pub async fn create(&self, input: &NewVideo) -> Result<i64> {
        let fields = input.to_fields()?;
        debug!("Creating video '{}'", fields.title);

        let mut tx = self.pool.begin().await?;
        let id = insert_row(&mut tx, None, &fields)
            .await?
            .ok_or_else(|| Error::Storage(sqlx::Error::RowNotFound))?;
        write_tag_index(&mut tx, id, &fields.tags).await?;
        tx.commit().await?;

        info!("Created video {} ('{}')", id, fields.title);
        Ok(id)
    }

    /// Insert a video keeping a caller-supplied id.
    ///
    /// Returns `None` without touching anything when the id is already taken.
    /// Later ids continue after the largest id seen.
    pub async fn import_record(&self, input: &NewVideo, id: Option<i64>) -> Result<Option<i64>> {
        let fields = input.to_fields()?;
        if let Some(id) = id {
            if !(1..=MAX_IMPORTED_ID).contains(&id) {
                return Err(Error::validation(format!(
                    "id must be between 1 and {}, got {}",
                    MAX_IMPORTED_ID, id
                )));
            }
        }

        let mut tx = self.pool.begin().await?;
        let inserted = insert_row(&mut tx, id, &fields).await?;
        if let Some(new_id) = inserted {
            write_tag_index(&mut tx, new_id, &fields.tags).await?;
        }
        tx.commit().await?;

        match inserted {
            Some(new_id) => debug!("Imported video {}", new_id),
            None => debug!("Video id {:?} already exists, skipped", id),
        }
        Ok(inserted)
    }

    /// Apply a partial update and return the updated entry
    pub async fn update(&self, id: i64, patch: &VideoPatch) -> Result<Video> {
        patch.validate()?;
        debug!("Updating video {}", id);
        self.modify(id, |fields| patch.apply(fields)).await
    }

    /// Move a video to another lifecycle state. Repeating a call is a no-op.
    pub async fn set_status(&self, id: i64, status: VideoStatus) -> Result<Video> {
        self.update(id, &VideoPatch::status(status)).await
    }

    /// Record a successful transcode: status ready plus media links.
    ///
    /// A `None` thumbnail leaves the stored thumbnail as it is.
    pub async fn mark_ready(
        &self,
        id: i64,
        video_url: impl Into<String>,
        thumbnail: Option<String>,
    ) -> Result<Video> {
        let patch = VideoPatch {
            status: Some(VideoStatus::Ready),
            video_url: Some(Some(video_url.into())),
            thumbnail: thumbnail.map(Some),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    /// Record a failed transcode: status failed and no media links
    pub async fn mark_failed(&self, id: i64) -> Result<Video> {
        let patch = VideoPatch {
            status: Some(VideoStatus::Failed),
            video_url: Some(None),
            thumbnail: Some(None),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    /// Add tags to a video, keeping tags added concurrently by others
    pub async fn add_tags<S: AsRef<str> + Sync>(&self, id: i64, tags: &[S]) -> Result<Video> {
        self.edit_tags(id, tags, &[] as &[&str]).await
    }

    /// Remove tags from a video; tags it does not carry are ignored
    pub async fn remove_tags<S: AsRef<str> + Sync>(&self, id: i64, tags: &[S]) -> Result<Video> {
        self.edit_tags(id, &[] as &[&str], tags).await
    }

    /// Add and remove tags in one transaction. Additions are applied first,
    /// so a tag named in both lists ends up removed.
    pub async fn edit_tags<A, R>(&self, id: i64, add: &[A], remove: &[R]) -> Result<Video>
    where
        A: AsRef<str> + Sync,
        R: AsRef<str> + Sync,
    {
        let extra = TagSet::parse(add)?;
        debug!(
            "Editing tags of video {}: +[{}] -{} tag(s)",
            id,
            extra,
            remove.len()
        );
        self.modify(id, |fields| {
            for tag in extra.iter() {
                fields.tags.insert(tag)?;
            }
            for tag in remove {
                fields.tags.remove(tag.as_ref());
            }
            Ok(())
        })
        .await
    }

    /// Delete a video and its tag index entries
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM video_tags WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::VideoNotFound(id));
        }

        tx.commit().await?;
        info!("Deleted video {}", id);
        Ok(())
    }

    /// Read-modify-write of one row under the write lock
    async fn modify<F>(&self, id: i64, change: F) -> Result<Video>
    where
        F: FnOnce(&mut VideoFields) -> Result<()>,
    {
        let mut tx = self.pool.begin().await?;
        claim_row(&mut tx, id).await?;

        let current = fetch_row(&mut tx, id)
            .await?
            .ok_or(Error::VideoNotFound(id))?;
        let before = current.fields();
        let mut after = before.clone();
        change(&mut after)?;

        if after != before {
            write_row(&mut tx, id, &after).await?;
            if !after.tags.same_members(&before.tags) {
                write_tag_index(&mut tx, id, &after.tags).await?;
            }
        }
        tx.commit().await?;

        Ok(after.into_video(id, current.created_at))
    }

    // ===== Reads =====

    /// Get video by ID
    pub async fn get(&self, id: i64) -> Result<Video> {
        self.find(id).await?.ok_or(Error::VideoNotFound(id))
    }

    /// Get video by ID, `None` if absent
    pub async fn find(&self, id: i64) -> Result<Option<Video>> {
        let mut conn = self.pool.acquire().await?;
        fetch_row(&mut conn, id).await
    }

    /// List an owner's videos
    pub async fn list_by_owner(&self, user_id: &str, order: ListOrder) -> Result<Vec<Video>> {
        let query = owner_query(order);
        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        collect_videos(rows)
    }

    /// List videos carrying a tag, looked up through the tag index
    pub async fn list_by_tag(&self, tag: &str, order: ListOrder) -> Result<Vec<Video>> {
        let query = tag_query(order);
        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .bind(tag.trim())
            .fetch_all(&self.pool)
            .await?;
        collect_videos(rows)
    }

    /// List every video
    pub async fn list_all(&self, order: ListOrder) -> Result<Vec<Video>> {
        let query = format!("SELECT {COLUMNS} FROM videos v ORDER BY {}", order.sql());
        let rows = sqlx::query_as::<_, VideoRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        collect_videos(rows)
    }

    /// Distinct tags across all videos, sorted
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        let tags: Vec<String> = sqlx::query_scalar("SELECT DISTINCT tag FROM video_tags ORDER BY tag")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    /// Distinct tags with the number of videos carrying each, sorted by tag
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>> {
        let counts = sqlx::query_as::<_, TagCount>(
            "SELECT tag, COUNT(*) AS video_count FROM video_tags GROUP BY tag ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    // ===== Statistics =====

    /// Get global statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM videos GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let owner_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT user_id) FROM videos WHERE user_id IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let tag_count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT tag) FROM video_tags")
            .fetch_one(&self.pool)
            .await?;

        let mut stats = StoreStats {
            owner_count: owner_count as usize,
            tag_count: tag_count as usize,
            ..Default::default()
        };
        for (status, count) in by_status {
            let count = count as usize;
            stats.video_count += count;
            match status.parse::<VideoStatus>() {
                Ok(VideoStatus::Processing) => stats.processing = count,
                Ok(VideoStatus::Ready) => stats.ready = count,
                Ok(VideoStatus::Failed) => stats.failed = count,
                Err(_) => {
                    let id: i64 = sqlx::query_scalar("SELECT id FROM videos WHERE status = ? LIMIT 1")
                        .bind(&status)
                        .fetch_one(&self.pool)
                        .await?;
                    return Err(Error::CorruptRecord {
                        id,
                        reason: format!("unknown status '{}'", status),
                    });
                }
            }
        }

        Ok(stats)
    }
}

/// An owner's videos, looked up through `idx_videos_user_id`
fn owner_query(order: ListOrder) -> String {
    format!(
        "SELECT {COLUMNS} FROM videos v WHERE v.user_id = ? ORDER BY {}",
        order.sql()
    )
}

/// Videos carrying a tag, driven from the `video_tags` primary key
fn tag_query(order: ListOrder) -> String {
    format!(
        "SELECT {COLUMNS} FROM video_tags t
         JOIN videos v ON v.id = t.video_id
         WHERE t.tag = ?
         ORDER BY {}",
        order.sql()
    )
}

/// Insert a row; `None` when an explicit id is already taken.
///
/// `created_at` never goes below the newest existing value, so creation time
/// follows insertion order even if the clock steps back.
async fn insert_row(
    conn: &mut SqliteConnection,
    id: Option<i64>,
    fields: &VideoFields,
) -> Result<Option<i64>> {
    let now = timestamp(Utc::now());
    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO videos (id, title, climbed_date, grade, climb_type, board_type,
                            thumbnail, video_url, tags, user_id, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                MAX(?12, COALESCE((SELECT MAX(created_at) FROM videos), ?12)))
        ON CONFLICT(id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(fields.climbed_date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(fields.grade)
    .bind(&fields.climb_type)
    .bind(&fields.board_type)
    .bind(&fields.thumbnail)
    .bind(&fields.video_url)
    .bind(serde_json::to_string(fields.tags.as_slice())?)
    .bind(&fields.user_id)
    .bind(fields.status.as_str())
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(inserted)
}

/// Take the write lock for this transaction, failing if the row is missing
async fn claim_row(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    let result = sqlx::query("UPDATE videos SET status = status WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::VideoNotFound(id));
    }
    Ok(())
}

async fn fetch_row(conn: &mut SqliteConnection, id: i64) -> Result<Option<Video>> {
    let query = format!("SELECT {COLUMNS} FROM videos v WHERE v.id = ?");
    sqlx::query_as::<_, VideoRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Video::try_from)
        .transpose()
}

async fn write_row(conn: &mut SqliteConnection, id: i64, fields: &VideoFields) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE videos SET
            title = ?,
            climbed_date = ?,
            grade = ?,
            climb_type = ?,
            board_type = ?,
            thumbnail = ?,
            video_url = ?,
            tags = ?,
            user_id = ?,
            status = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(fields.climbed_date.map(|d| d.format(DATE_FORMAT).to_string()))
    .bind(fields.grade)
    .bind(&fields.climb_type)
    .bind(&fields.board_type)
    .bind(&fields.thumbnail)
    .bind(&fields.video_url)
    .bind(serde_json::to_string(fields.tags.as_slice())?)
    .bind(&fields.user_id)
    .bind(fields.status.as_str())
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replace the tag index entries of one video
async fn write_tag_index(conn: &mut SqliteConnection, id: i64, tags: &TagSet) -> Result<()> {
    sqlx::query("DELETE FROM video_tags WHERE video_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    for tag in tags.iter() {
        sqlx::query("INSERT INTO video_tags (tag, video_id) VALUES (?, ?)")
            .bind(tag)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// A tag and how many videos carry it
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub video_count: i64,
}

/// Global statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub video_count: usize,
    pub processing: usize,
    pub ready: usize,
    pub failed: usize,
    pub owner_count: usize,
    pub tag_count: usize,
}
