//! Tag listing command

use crate::error::Result;
use crate::store::{TagCount, VideoStore};

/// Every tag in use with the number of videos carrying it
pub async fn cmd_tags(store: &VideoStore) -> Result<Vec<TagCount>> {
    store.tag_counts().await
}

pub fn print_tags(tags: &[TagCount]) {
    println!("\n🏷  Tags\n");

    if tags.is_empty() {
        println!("No tags yet. Use 'climblog tag <id> --add <tag>' to tag a video.");
        return;
    }

    let width = tags.iter().map(|t| t.tag.chars().count()).max().unwrap_or(0);
    for tag in tags {
        println!("  {:<width$}  {}", tag.tag, tag.video_count, width = width);
    }
}
