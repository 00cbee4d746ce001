//! Parser for catalog export files.
//!
//! Two JSON documents make up a catalog directory:
//! - videos.json: array of video records
//! - users.json: array of user profiles
//!
//! Video exports from the app carry the full `comments` array rather than a
//! count. We only keep the length, so ranking never drags comment bodies
//! around.

use crate::error::{CatalogError, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::fs;
use std::path::Path;

/// Wire shape of a video as exported by the app
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRecord {
    id: VideoId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    channel_id: ChannelId,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    dislikes: u64,
    #[serde(default)]
    comment_count: Option<u64>,
    #[serde(default)]
    comments: Vec<IgnoredAny>,
    #[serde(default)]
    uploaded_at: DateTime<Utc>,
    #[serde(default)]
    is_short: bool,
}

impl From<VideoRecord> for Video {
    fn from(record: VideoRecord) -> Self {
        // An explicit count wins over the embedded list
        let comment_count = record
            .comment_count
            .unwrap_or(record.comments.len() as u64);

        Video {
            id: record.id,
            title: record.title,
            category: record.category,
            tags: record.tags,
            channel_id: record.channel_id,
            views: record.views,
            likes: record.likes,
            dislikes: record.dislikes,
            comment_count,
            uploaded_at: record.uploaded_at,
            is_short: record.is_short,
        }
    }
}

/// Read a JSON array from `path`, tagging decode errors with the file name
fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| CatalogError::JsonError {
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        line: e.line(),
        reason: e.to_string(),
    })
}

/// Parse the videos.json file
pub fn parse_videos(path: &Path) -> Result<Vec<Video>> {
    let records: Vec<VideoRecord> = read_json_array(path)?;
    Ok(records.into_iter().map(Video::from).collect())
}

/// Parse the users.json file
pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    read_json_array(path)
}

/// Decode a video list from an in-memory JSON string
pub fn videos_from_str(json: &str) -> Result<Vec<Video>> {
    let records: Vec<VideoRecord> =
        serde_json::from_str(json).map_err(|e| CatalogError::JsonError {
            file: "<memory>".to_string(),
            line: e.line(),
            reason: e.to_string(),
        })?;
    Ok(records.into_iter().map(Video::from).collect())
}
