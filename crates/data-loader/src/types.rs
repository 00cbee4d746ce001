//! Core domain types for the video catalog.
//!
//! These are the records the ranking engine reads. They are owned by the
//! state layer (device storage or a backend fetch); the engine never mutates
//! them.
//!
//! Every numeric field and collection carries `#[serde(default)]`: an export
//! that omits `likes` or `tags` still loads, with zero / empty in their place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a video
pub type VideoId = String;

/// Unique identifier for a channel (the uploading account)
pub type ChannelId = String;

/// Unique identifier for a user
pub type UserId = String;

/// Both watch histories keep at most this many entries, most recent first
pub const WATCH_HISTORY_CAP: usize = 100;

// =============================================================================
// Video
// =============================================================================

/// A single uploaded video, long-form or short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    #[serde(default)]
    pub title: String,
    /// Single free-text category tag ("Gaming", "Music", ...)
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub channel_id: ChannelId,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    /// Number of comments. Stored as a count so ranking never needs the
    /// comment bodies.
    #[serde(default)]
    pub comment_count: u64,
    /// Missing timestamps fall back to the Unix epoch, i.e. "very old"
    #[serde(default)]
    pub uploaded_at: DateTime<Utc>,
    /// Short-form videos only ever appear in the shorts feed
    #[serde(default)]
    pub is_short: bool,
}

impl Video {
    /// Minimal long-form video; handy in tests and fixtures
    pub fn new(id: impl Into<VideoId>, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            category: String::new(),
            tags: Vec::new(),
            channel_id: String::new(),
            views: 0,
            likes: 0,
            dislikes: 0,
            comment_count: 0,
            uploaded_at,
            is_short: false,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// One entry of the detailed watch history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub video_id: VideoId,
    #[serde(default)]
    pub watched_at: DateTime<Utc>,
    /// Last playback position in milliseconds
    #[serde(default)]
    pub position_ms: u64,
    /// Total video duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl WatchRecord {
    /// Fraction of the video watched, 0.0 when the duration is unknown
    pub fn completion(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            self.position_ms as f64 / self.duration_ms as f64
        }
    }
}

/// A user profile with the affinity signals the ranking engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    /// Recently watched video ids, most recent first
    #[serde(default)]
    pub watch_history: Vec<VideoId>,
    /// Recently watched videos with playback progress, most recent first
    #[serde(default)]
    pub watch_history_detailed: Vec<WatchRecord>,
    /// Channels this user follows
    #[serde(default)]
    pub subscriptions: HashSet<ChannelId>,
    #[serde(default)]
    pub liked_videos: HashSet<VideoId>,
}

impl User {
    /// Cold-start user: no history, subscriptions or likes
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Record a watch at `at` with the given playback progress.
    ///
    /// The video moves to the front of both histories; an older entry for the
    /// same video is dropped so each id appears once. Both lists are capped at
    /// [`WATCH_HISTORY_CAP`].
    pub fn record_watch(
        &mut self,
        video_id: &str,
        position_ms: u64,
        duration_ms: u64,
        at: DateTime<Utc>,
    ) {
        self.watch_history.retain(|id| id != video_id);
        self.watch_history.insert(0, video_id.to_string());
        self.watch_history.truncate(WATCH_HISTORY_CAP);

        self.watch_history_detailed.retain(|r| r.video_id != video_id);
        self.watch_history_detailed.insert(
            0,
            WatchRecord {
                video_id: video_id.to_string(),
                watched_at: at,
                position_ms,
                duration_ms,
            },
        );
        self.watch_history_detailed.truncate(WATCH_HISTORY_CAP);
    }

    /// Flip the like state of a video. Returns true if the video is now liked.
    pub fn toggle_like(&mut self, video_id: &str) -> bool {
        if self.liked_videos.remove(video_id) {
            false
        } else {
            self.liked_videos.insert(video_id.to_string());
            true
        }
    }

    /// Flip the subscription to a channel. Returns true if now subscribed.
    pub fn toggle_subscription(&mut self, channel_id: &str) -> bool {
        if self.subscriptions.remove(channel_id) {
            false
        } else {
            self.subscriptions.insert(channel_id.to_string());
            true
        }
    }
}

// =============================================================================
// VideoCatalog - The In-Memory Store
// =============================================================================

/// Holds every loaded video and user.
///
/// Videos keep their load order: the ranking engine breaks score ties by
/// input order, so a catalog iterated twice must yield the same sequence.
#[derive(Debug, Default)]
pub struct VideoCatalog {
    pub(crate) videos: Vec<Video>,
    /// Position of each video inside `videos`
    pub(crate) positions: HashMap<VideoId, usize>,
    pub(crate) users: HashMap<UserId, User>,
}

impl VideoCatalog {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// All videos in load order
    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    /// Get a video by ID
    pub fn get_video(&self, id: &str) -> Option<&Video> {
        self.positions.get(id).map(|&pos| &self.videos[pos])
    }

    /// Get a user by ID
    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    /// Mutable access for the state layer (watch tracking, likes)
    pub fn get_user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.get_mut(id)
    }

    /// All users, in no particular order
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Insert a video, replacing an existing one with the same id in place
    pub fn insert_video(&mut self, video: Video) {
        match self.positions.get(&video.id) {
            Some(&pos) => self.videos[pos] = video,
            None => {
                self.positions.insert(video.id.clone(), self.videos.len());
                self.videos.push(video);
            }
        }
    }

    /// Insert a user, replacing any previous profile with the same id
    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// (users, videos, shorts) counts for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        let shorts = self.videos.iter().filter(|v| v.is_short).count();
        (self.users.len(), self.videos.len(), shorts)
    }
}
