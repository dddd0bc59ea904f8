//! SQLite schema definition

/// SQL schema for the journal database
pub const SCHEMA_SQL: &str = r#"
-- Videos: one journal entry per uploaded climbing video.
-- AUTOINCREMENT keeps ids of deleted rows from being handed out again.
CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    climbed_date TEXT,
    grade INTEGER DEFAULT 0,
    climb_type TEXT,
    board_type TEXT,
    thumbnail TEXT,
    video_url TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    user_id TEXT,
    status TEXT NOT NULL DEFAULT 'processing'
        CHECK (status IN ('processing', 'ready', 'failed')),
    created_at TEXT NOT NULL
);

-- Tag index: one row per (tag, video), kept in step with videos.tags
CREATE TABLE IF NOT EXISTS video_tags (
    tag TEXT NOT NULL,
    video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
    PRIMARY KEY (tag, video_id)
) WITHOUT ROWID;

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_videos_user_id ON videos(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_videos_created ON videos(created_at);
CREATE INDEX IF NOT EXISTS idx_video_tags_video ON video_tags(video_id);
"#;

/// Date format for `videos.climbed_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";
