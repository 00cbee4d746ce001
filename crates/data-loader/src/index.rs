//! VideoCatalog building and validation.
//!
//! Turns a directory holding `videos.json` and `users.json` into a ready
//! `VideoCatalog`. Both files are parsed in parallel with `rayon::join`.

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{debug, info};

impl VideoCatalog {
    /// Load a catalog directory
    ///
    /// Steps:
    /// 1. Parse videos.json and users.json in parallel
    /// 2. Insert videos (file order becomes catalog order) and users
    /// 3. Validate ids
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading video catalog from {:?}", data_dir);

        let videos_path = data_dir.join("videos.json");
        let users_path = data_dir.join("users.json");

        let (videos, users) = rayon::join(
            || parser::parse_videos(&videos_path),
            || parser::parse_users(&users_path),
        );
        let videos = videos?;
        let users = users?;

        info!("Parsed {} videos, {} users", videos.len(), users.len());

        let catalog = Self::from_parts(videos, users);
        catalog.validate()?;

        let (users, videos, shorts) = catalog.counts();
        info!(
            "Catalog ready: {} users, {} videos ({} shorts)",
            users, videos, shorts
        );
        Ok(catalog)
    }

    /// Build a catalog from already-decoded records
    ///
    /// Histories longer than [`WATCH_HISTORY_CAP`] keep only their newest
    /// entries.
    pub fn from_parts(videos: Vec<Video>, users: Vec<User>) -> Self {
        let mut catalog = Self::new();
        for video in videos {
            catalog.insert_video(video);
        }
        for mut user in users {
            if user.watch_history.len() > WATCH_HISTORY_CAP
                || user.watch_history_detailed.len() > WATCH_HISTORY_CAP
            {
                debug!(
                    "User {} history trimmed to {} entries (had {} / {})",
                    user.id,
                    WATCH_HISTORY_CAP,
                    user.watch_history.len(),
                    user.watch_history_detailed.len()
                );
                user.watch_history.truncate(WATCH_HISTORY_CAP);
                user.watch_history_detailed.truncate(WATCH_HISTORY_CAP);
            }
            catalog.insert_user(user);
        }
        catalog
    }

    /// Validate data integrity
    ///
    /// Empty ids are rejected. Dangling references (a history entry or like
    /// pointing at a video that was deleted) are normal for this app and only
    /// logged; the engine skips them.
    pub fn validate(&self) -> Result<()> {
        if let Some(video) = self.videos.iter().find(|v| v.id.trim().is_empty()) {
            return Err(CatalogError::InvalidValue {
                field: "video.id".to_string(),
                value: format!("{:?} (title {:?})", video.id, video.title),
            });
        }

        for user in self.users.values() {
            if user.id.trim().is_empty() {
                return Err(CatalogError::ValidationError(format!(
                    "user with empty id (name {:?})",
                    user.name
                )));
            }

            let dangling = user
                .watch_history
                .iter()
                .chain(user.watch_history_detailed.iter().map(|r| &r.video_id))
                .chain(user.liked_videos.iter())
                .filter(|id| !self.positions.contains_key(id.as_str()))
                .count();
            if dangling > 0 {
                debug!(
                    "User {} references {} unknown videos",
                    user.id, dangling
                );
            }
        }
        Ok(())
    }

    /// Check that a user exists, for callers that need a hard error
    pub fn require_user(&self, id: &str) -> Result<&User> {
        self.get_user(id).ok_or_else(|| CatalogError::MissingReference {
            entity: "User".to_string(),
            id: id.to_string(),
        })
    }

    /// Check that a video exists, for callers that need a hard error
    pub fn require_video(&self, id: &str) -> Result<&Video> {
        self.get_video(id).ok_or_else(|| CatalogError::MissingReference {
            entity: "Video".to_string(),
            id: id.to_string(),
        })
    }
}
