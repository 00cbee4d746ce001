//! Per-call extraction of a user's affinity signals.
//!
//! Everything the scorers ask about the user ("is this channel followed?",
//! "how often does this category show up in their history?") is gathered
//! once up front into hash sets and maps, so scoring each candidate is a
//! handful of O(1) lookups. Nothing here is cached across calls.

use data_loader::{User, Video};
use std::collections::{HashMap, HashSet};

/// Affinity signals for one user, borrowed from the user and the video pool
#[derive(Debug, Default)]
pub struct UserSignals<'a> {
    /// Ids in the most recent slice of the simple watch history
    pub recent: HashSet<&'a str>,
    /// Followed channels
    pub subscriptions: HashSet<&'a str>,
    /// Completion ratio of each detailed-history video (most recent record wins)
    pub completions: HashMap<&'a str, f64>,
    /// How many detailed-history entries fall into each category
    pub category_counts: HashMap<&'a str, usize>,
    /// Length of the detailed history, the affinity denominator
    pub history_len: usize,
    /// Categories of the videos the user liked
    pub liked_categories: HashSet<&'a str>,
}

impl<'a> UserSignals<'a> {
    /// Gather signals for `user` against `pool`.
    ///
    /// `recent_window` is how many of the newest simple-history ids count as
    /// "just watched". History entries and likes whose video isn't in the
    /// pool are skipped for category lookups, but still count toward
    /// `history_len`.
    pub fn build(user: &'a User, pool: &'a [Video], recent_window: usize) -> Self {
        let by_id: HashMap<&str, &Video> = pool.iter().map(|v| (v.id.as_str(), v)).collect();

        let recent = user
            .watch_history
            .iter()
            .take(recent_window)
            .map(String::as_str)
            .collect();

        let subscriptions = user.subscriptions.iter().map(String::as_str).collect();

        let mut completions = HashMap::new();
        let mut category_counts: HashMap<&str, usize> = HashMap::new();
        for record in &user.watch_history_detailed {
            completions
                .entry(record.video_id.as_str())
                .or_insert_with(|| record.completion());

            if let Some(&video) = by_id.get(record.video_id.as_str()) {
                *category_counts.entry(video.category.as_str()).or_insert(0) += 1;
            }
        }

        let liked_categories = user
            .liked_videos
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .map(|video| video.category.as_str())
            .collect();

        Self {
            recent,
            subscriptions,
            completions,
            category_counts,
            history_len: user.watch_history_detailed.len(),
            liked_categories,
        }
    }

    /// Share of the detailed history spent in `category`, in [0, 1]
    pub fn category_share(&self, category: &str) -> f64 {
        if self.history_len == 0 {
            return 0.0;
        }
        let count = self.category_counts.get(category).copied().unwrap_or(0);
        count as f64 / self.history_len as f64
    }

    pub fn is_subscribed(&self, channel_id: &str) -> bool {
        self.subscriptions.contains(channel_id)
    }

    pub fn recently_watched(&self, video_id: &str) -> bool {
        self.recent.contains(video_id)
    }

    /// Completion of a partially watched video, if the user has a record
    pub fn completion(&self, video_id: &str) -> Option<f64> {
        self.completions.get(video_id).copied()
    }

    pub fn likes_category(&self, category: &str) -> bool {
        self.liked_categories.contains(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use data_loader::WatchRecord;

    fn video(id: &str, category: &str) -> Video {
        let mut v = Video::new(id, Utc::now());
        v.category = category.to_string();
        v
    }

    fn record(id: &str, position_ms: u64, duration_ms: u64) -> WatchRecord {
        WatchRecord {
            video_id: id.to_string(),
            watched_at: Utc::now(),
            position_ms,
            duration_ms,
        }
    }

    #[test]
    fn test_cold_start_user() {
        let pool = vec![video("a", "Music")];
        let user = User::new("u1");
        let signals = UserSignals::build(&user, &pool, 10);

        assert_eq!(signals.category_share("Music"), 0.0);
        assert!(!signals.is_subscribed("c1"));
        assert!(signals.completion("a").is_none());
        assert!(signals.liked_categories.is_empty());
    }

    #[test]
    fn test_category_share_counts_unknown_in_denominator() {
        let pool = vec![video("a", "Music"), video("b", "Music"), video("c", "Gaming")];
        let mut user = User::new("u1");
        user.watch_history_detailed = vec![
            record("a", 0, 1000),
            record("b", 0, 1000),
            record("c", 0, 1000),
            record("deleted", 0, 1000),
        ];
        let signals = UserSignals::build(&user, &pool, 10);

        assert!((signals.category_share("Music") - 0.5).abs() < 1e-9);
        assert!((signals.category_share("Gaming") - 0.25).abs() < 1e-9);
        assert_eq!(signals.category_share("News"), 0.0);
    }

    #[test]
    fn test_recent_window_only_takes_newest() {
        let pool: Vec<Video> = Vec::new();
        let mut user = User::new("u1");
        user.watch_history = (0..15).map(|i| format!("v{}", i)).collect();
        let signals = UserSignals::build(&user, &pool, 10);

        assert!(signals.recently_watched("v0"));
        assert!(signals.recently_watched("v9"));
        assert!(!signals.recently_watched("v10"));
    }

    #[test]
    fn test_completion_uses_most_recent_record() {
        let pool: Vec<Video> = Vec::new();
        let mut user = User::new("u1");
        user.watch_history_detailed = vec![record("a", 500, 1000), record("a", 100, 1000)];
        let signals = UserSignals::build(&user, &pool, 10);

        assert_eq!(signals.completion("a"), Some(0.5));
    }

    #[test]
    fn test_liked_categories_skip_missing_videos() {
        let pool = vec![video("a", "Comedy")];
        let mut user = User::new("u1");
        user.liked_videos.insert("a".to_string());
        user.liked_videos.insert("gone".to_string());
        let signals = UserSignals::build(&user, &pool, 10);

        assert!(signals.likes_category("Comedy"));
        assert_eq!(signals.liked_categories.len(), 1);
    }
}
