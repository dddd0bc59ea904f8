//! climblog - a personal climbing video journal
//!
//! This crate provides:
//! - A SQLite-backed store of video entries with owner and tag indexes
//! - Import of the legacy `videos.json` journal dump
//! - The commands behind the `climblog` CLI

pub mod commands;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod progress;
pub mod store;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use models::{ListOrder, NewVideo, TagSet, Video, VideoPatch, VideoStatus};
pub use store::VideoStore;
