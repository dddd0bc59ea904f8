//! Journal entry types shared by the store, the importer and the CLI.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Processing lifecycle of an uploaded video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    /// Uploaded, transcoding not finished yet
    #[default]
    Processing,
    /// Transcoded media is available for playback
    Ready,
    /// Transcoding gave up; there is no playable media
    Failed,
}

impl VideoStatus {
    pub const ALL: [VideoStatus; 3] = [
        VideoStatus::Processing,
        VideoStatus::Ready,
        VideoStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the exact lowercase names only
impl FromStr for VideoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processing" => Ok(VideoStatus::Processing),
            "ready" => Ok(VideoStatus::Ready),
            "failed" => Ok(VideoStatus::Failed),
            _ => Err(Error::validation(format!(
                "Unknown video status: {} (expected processing, ready or failed)",
                s
            ))),
        }
    }
}

/// Tags attached to a video.
///
/// Behaves as a set: membership ignores order and duplicates collapse onto
/// the first occurrence, whose position is kept for display. Tags are
/// trimmed and compared case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from user input, rejecting blank tags
    pub fn parse<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for tag in tags {
            set.insert(tag.as_ref())?;
        }
        Ok(set)
    }

    /// Add a tag. Returns `false` if it was already present.
    pub fn insert(&mut self, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::validation("tags must not be blank"));
        }
        if self.contains(tag) {
            return Ok(false);
        }
        self.0.push(tag.to_string());
        Ok(true)
    }

    /// Remove a tag. Returns `false` if it was not present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Set equality, ignoring order
    pub fn same_members(&self, other: &TagSet) -> bool {
        self.len() == other.len() && self.iter().all(|t| other.contains(t))
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// A journal entry for one uploaded climbing video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub climbed_date: Option<NaiveDate>,
    pub grade: i32,
    pub climb_type: Option<String>,
    pub board_type: Option<String>,
    pub thumbnail: Option<String>,
    pub video_url: Option<String>,
    pub tags: TagSet,
    pub user_id: Option<String>,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
}

impl Video {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Ready with a media link to play
    pub fn is_playable(&self) -> bool {
        self.status == VideoStatus::Ready && self.video_url.is_some()
    }

    pub(crate) fn fields(&self) -> VideoFields {
        VideoFields {
            title: self.title.clone(),
            climbed_date: self.climbed_date,
            grade: self.grade,
            climb_type: self.climb_type.clone(),
            board_type: self.board_type.clone(),
            thumbnail: self.thumbnail.clone(),
            video_url: self.video_url.clone(),
            tags: self.tags.clone(),
            user_id: self.user_id.clone(),
            status: self.status,
        }
    }
}

/// Input for creating a video entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub climbed_date: Option<NaiveDate>,
    /// Defaults to 0
    #[serde(default)]
    pub grade: Option<i32>,
    #[serde(default)]
    pub climb_type: Option<String>,
    #[serde(default)]
    pub board_type: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Defaults to processing
    #[serde(default)]
    pub status: Option<VideoStatus>,
}

impl NewVideo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Check the input and resolve defaults
    pub(crate) fn to_fields(&self) -> Result<VideoFields> {
        validate_title(&self.title)?;
        validate_owner(self.user_id.as_deref())?;
        Ok(VideoFields {
            title: self.title.clone(),
            climbed_date: self.climbed_date,
            grade: self.grade.unwrap_or(0),
            climb_type: self.climb_type.clone(),
            board_type: self.board_type.clone(),
            thumbnail: self.thumbnail.clone(),
            video_url: self.video_url.clone(),
            tags: TagSet::parse(&self.tags)?,
            user_id: self.user_id.clone(),
            status: self.status.unwrap_or_default(),
        })
    }
}

/// Partial update of a video's mutable fields.
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` clears
/// the value and `Some(Some(v))` sets it. `tags` replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub climbed_date: Option<Option<NaiveDate>>,
    pub grade: Option<i32>,
    pub climb_type: Option<Option<String>>,
    pub board_type: Option<Option<String>>,
    pub thumbnail: Option<Option<String>>,
    pub video_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub user_id: Option<Option<String>>,
    pub status: Option<VideoStatus>,
}

impl VideoPatch {
    pub fn status(status: VideoStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject malformed values before anything is written
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(owner) = &self.user_id {
            validate_owner(owner.as_deref())?;
        }
        if let Some(tags) = &self.tags {
            TagSet::parse(tags)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, fields: &mut VideoFields) -> Result<()> {
        if let Some(title) = &self.title {
            fields.title = title.clone();
        }
        if let Some(date) = self.climbed_date {
            fields.climbed_date = date;
        }
        if let Some(grade) = self.grade {
            fields.grade = grade;
        }
        if let Some(v) = &self.climb_type {
            fields.climb_type = v.clone();
        }
        if let Some(v) = &self.board_type {
            fields.board_type = v.clone();
        }
        if let Some(v) = &self.thumbnail {
            fields.thumbnail = v.clone();
        }
        if let Some(v) = &self.video_url {
            fields.video_url = v.clone();
        }
        if let Some(tags) = &self.tags {
            fields.tags = TagSet::parse(tags)?;
        }
        if let Some(v) = &self.user_id {
            fields.user_id = v.clone();
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        Ok(())
    }
}

/// The mutable part of a video row
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VideoFields {
    pub title: String,
    pub climbed_date: Option<NaiveDate>,
    pub grade: i32,
    pub climb_type: Option<String>,
    pub board_type: Option<String>,
    pub thumbnail: Option<String>,
    pub video_url: Option<String>,
    pub tags: TagSet,
    pub user_id: Option<String>,
    pub status: VideoStatus,
}

impl VideoFields {
    pub fn into_video(self, id: i64, created_at: DateTime<Utc>) -> Video {
        Video {
            id,
            title: self.title,
            climbed_date: self.climbed_date,
            grade: self.grade,
            climb_type: self.climb_type,
            board_type: self.board_type,
            thumbnail: self.thumbnail,
            video_url: self.video_url,
            tags: self.tags,
            user_id: self.user_id,
            status: self.status,
            created_at,
        }
    }
}

/// Ordering of list results by creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl ListOrder {
    /// ORDER BY clause for a query that aliases `videos` as `v`
    pub(crate) fn sql(self) -> &'static str {
        match self {
            ListOrder::NewestFirst => "v.created_at DESC, v.id DESC",
            ListOrder::OldestFirst => "v.created_at ASC, v.id ASC",
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("title must not be empty"));
    }
    Ok(())
}

fn validate_owner(user_id: Option<&str>) -> Result<()> {
    if matches!(user_id, Some(owner) if owner.trim().is_empty()) {
        return Err(Error::validation("user_id must not be empty when set"));
    }
    Ok(())
}
