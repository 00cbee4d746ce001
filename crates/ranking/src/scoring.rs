//! Scoring terms shared by the four surfaces.
//!
//! Each function computes one additive term from plain numbers so the
//! surfaces can't drift apart when a weight is tuned. Every division is
//! guarded: a zero denominator contributes 0, never NaN or infinity.

use crate::config::FeedWeights;
use chrono::{DateTime, Utc};
use data_loader::{Video, VideoId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Why a video was picked, shown next to it in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Reason {
    MatchesInterests,
    RecentlyUploaded,
    Popular,
    SubscribedChannel,
    ContinueWatching,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::MatchesInterests => "Matches your interests",
            Reason::RecentlyUploaded => "Recently uploaded",
            Reason::Popular => "Popular video",
            Reason::SubscribedChannel => "From subscribed channel",
            Reason::ContinueWatching => "Continue watching",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored candidate. Lives for one call, then gets sorted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationScore {
    pub video_id: VideoId,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

impl RecommendationScore {
    pub fn new(video_id: impl Into<VideoId>, score: f64) -> Self {
        Self {
            video_id: video_id.into(),
            score,
            reasons: Vec::new(),
        }
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Fractional days between `uploaded_at` and `now` (negative for future dates)
pub fn age_in_days(uploaded_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - uploaded_at).num_milliseconds() as f64 / MS_PER_DAY
}

/// Step bonus by upload age: 25 / 20 / 15 / 10 / 5
pub fn freshness_score(age_days: f64) -> f64 {
    match age_days {
        d if d < 1.0 => 25.0,
        d if d < 7.0 => 20.0,
        d if d < 30.0 => 15.0,
        d if d < 90.0 => 10.0,
        _ => 5.0,
    }
}

/// View-normalized likes, like ratio and comment density, summed.
pub fn engagement_score(video: &Video, weights: &FeedWeights) -> f64 {
    let views = video.views as f64;
    let likes = video.likes as f64;
    let votes = likes + video.dislikes as f64;

    safe_div(likes + 0.1 * views, views) * weights.view_engagement
        + safe_div(likes, votes) * weights.like_ratio
        + safe_div(video.comment_count as f64, views) * weights.comment_density
}

/// Saturating reach bonus from views and likes
pub fn popularity_score(video: &Video, weights: &FeedWeights) -> f64 {
    let views = safe_div(video.views as f64, weights.views_saturation).min(1.0);
    let likes = safe_div(video.likes as f64, weights.likes_saturation).min(1.0);
    views * weights.popularity_views + likes * weights.popularity_likes
}

/// Rewards candidates whose view count has the same order of magnitude as
/// the reference, tapering linearly per decade and floored at 0.
pub fn popularity_closeness(
    candidate_views: u64,
    reference_views: u64,
    max: f64,
    slope: f64,
) -> f64 {
    let distance = ((candidate_views as f64 + 1.0).log10()
        - (reference_views as f64 + 1.0).log10())
    .abs();
    (max - slope * distance).max(0.0)
}

/// Number of distinct tags the two videos have in common
pub fn shared_tag_count(a: &Video, b: &Video) -> usize {
    let tags: HashSet<&str> = a.tags.iter().map(String::as_str).collect();
    b.tags
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .intersection(&tags)
        .count()
}

/// Trending score: view velocity times engagement rate, scaled by 1000.
///
/// Velocity divides by at least 0.1 days so same-day uploads don't explode.
pub fn trending_score(video: &Video, age_days: f64) -> f64 {
    let views = video.views as f64;
    let velocity = views / age_days.max(0.1);
    let engagement = (video.likes as f64 + 2.0 * video.comment_count as f64) / views.max(1.0);
    velocity * engagement * 1000.0
}

/// A candidate paired with its score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedVideo<'v> {
    pub video: &'v Video,
    pub score: RecommendationScore,
}

impl<'v> RankedVideo<'v> {
    pub fn new(video: &'v Video, score: f64) -> Self {
        Self {
            video,
            score: RecommendationScore::new(video.id.clone(), score),
        }
    }
}

/// Sort by descending score and keep the top `limit`.
///
/// The sort is stable, so equal scores keep their input order. NaN scores
/// sink to the end.
pub fn rank_and_select(mut ranked: Vec<RankedVideo<'_>>, limit: usize) -> Vec<RankedVideo<'_>> {
    ranked.sort_by(|a, b| {
        let (a, b) = (a.score.score, b.score.score);
        a.is_nan().cmp(&b.is_nan()).then_with(|| b.total_cmp(&a))
    });
    ranked.truncate(limit);
    ranked
}
