//! Video entry commands: add, show, update, status changes, tags, list, delete

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{ListOrder, NewVideo, Video, VideoPatch, VideoStatus};
use crate::store::VideoStore;
use tracing::info;

/// Which videos `list` returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Owner(String),
    Tag(String),
}

/// Add a video, recording the configured owner when none is given
pub async fn cmd_add(config: &Config, store: &VideoStore, mut input: NewVideo) -> Result<Video> {
    if input.user_id.is_none() {
        input.user_id = config.default_owner.clone();
    }

    let id = store.create(&input).await?;
    info!("Added video {} '{}'", id, input.title);
    store.get(id).await
}

pub async fn cmd_show(store: &VideoStore, id: i64) -> Result<Video> {
    store.get(id).await
}

/// Apply a partial update
pub async fn cmd_update(store: &VideoStore, id: i64, patch: VideoPatch) -> Result<Video> {
    if patch.is_empty() {
        return Err(Error::Validation(
            "Nothing to update: pass at least one field".to_string(),
        ));
    }

    let video = store.update(id, &patch).await?;
    info!("Updated video {}", id);
    Ok(video)
}

/// Set the status from its textual form
pub async fn cmd_set_status(store: &VideoStore, id: i64, status: &str) -> Result<Video> {
    let status: VideoStatus = status.parse()?;
    store.set_status(id, status).await
}

pub async fn cmd_mark_ready(
    store: &VideoStore,
    id: i64,
    video_url: String,
    thumbnail: Option<String>,
) -> Result<Video> {
    store.mark_ready(id, video_url, thumbnail).await
}

pub async fn cmd_mark_failed(store: &VideoStore, id: i64) -> Result<Video> {
    store.mark_failed(id).await
}

/// Add and remove tags in one step; additions are applied first
pub async fn cmd_tag(
    store: &VideoStore,
    id: i64,
    add: &[String],
    remove: &[String],
) -> Result<Video> {
    if add.is_empty() && remove.is_empty() {
        return Err(Error::Validation(
            "Pass at least one tag to add or remove".to_string(),
        ));
    }

    store.edit_tags(id, add, remove).await
}

pub async fn cmd_list(store: &VideoStore, filter: &ListFilter, order: ListOrder) -> Result<Vec<Video>> {
    match filter {
        ListFilter::All => store.list_all(order).await,
        ListFilter::Owner(user_id) => store.list_by_owner(user_id, order).await,
        ListFilter::Tag(tag) => store.list_by_tag(tag, order).await,
    }
}

pub async fn cmd_delete(store: &VideoStore, id: i64) -> Result<()> {
    store.delete(id).await?;
    info!("Deleted video {}", id);
    Ok(())
}

/// Print one video in full
pub fn print_video(video: &Video) {
    println!("\n🎬 {} (#{})\n", video.title, video.id);
    if video.is_playable() {
        println!("Status: {} (playable)", video.status);
    } else {
        println!("Status: {}", video.status);
    }
    println!("Grade: V{}", video.grade);
    if let Some(date) = video.climbed_date {
        println!("Climbed: {}", date);
    }
    if let Some(climb_type) = &video.climb_type {
        println!("Type: {}", climb_type);
    }
    if let Some(board) = &video.board_type {
        println!("Board: {}", board);
    }
    if !video.tags.is_empty() {
        println!("Tags: {}", video.tags);
    }
    if let Some(owner) = &video.user_id {
        println!("Owner: {}", owner);
    }
    if let Some(url) = &video.video_url {
        println!("Video: {}", url);
    }
    if let Some(thumbnail) = &video.thumbnail {
        println!("Thumbnail: {}", thumbnail);
    }
    println!("Created: {}", video.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

/// Print a list of videos, one line each
pub fn print_videos(videos: &[Video]) {
    if videos.is_empty() {
        println!("No videos found. Use 'climblog add' to log one.");
        return;
    }

    for video in videos {
        let status = match video.status {
            VideoStatus::Ready => "✓",
            VideoStatus::Processing => "…",
            VideoStatus::Failed => "✗",
        };
        print!("{} #{:<5} V{:<3} {}", status, video.id, video.grade, video.title);
        if !video.tags.is_empty() {
            print!("  [{}]", video.tags);
        }
        println!();
    }
    println!("\n{} video(s)", videos.len());
}
