//! # Recommendation Engine
//!
//! Scores and orders videos for the four consumption surfaces:
//!
//! | Surface          | Entry point                | Pool       | Default limit |
//! |------------------|----------------------------|------------|---------------|
//! | Home feed        | `get_recommendations`      | long-form  | 20            |
//! | Trending shelf   | `get_trending_videos`      | long-form  | 20            |
//! | Related rail     | `get_similar_videos`       | long-form  | 10            |
//! | Shorts feed      | `get_personalized_shorts`  | shorts     | 30            |
//!
//! Every call follows the same three stages:
//! 1. Narrow the pool with a `FilterPipeline`
//! 2. Score each candidate (in parallel with Rayon)
//! 3. Stable-sort by descending score and truncate to the limit
//!
//! The engine holds no per-call state. Scores are computed fresh each time
//! from the inputs, so a mutated catalog is reflected on the very next call.
//!
//! ## Randomness
//! The home feed adds up to 5 points of jitter and the shorts feed a 0-30
//! exploration base. Draws go through the injected [`JitterSource`] and are
//! taken sequentially in candidate order before the parallel scoring step,
//! so a seeded source replays exactly.

use crate::clock::{Clock, SystemClock};
use crate::config::RankingWeights;
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{ExcludeIdsFilter, ExcludeVideoFilter, FormatFilter, UploadWindowFilter};
use crate::jitter::{JitterSource, ThreadRngJitter};
use crate::scoring::{self, RankedVideo, Reason};
use crate::signals::UserSignals;
use crate::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use data_loader::{User, Video};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 20;
pub const DEFAULT_TRENDING_LIMIT: usize = 20;
pub const DEFAULT_SIMILAR_LIMIT: usize = 10;
pub const DEFAULT_SHORTS_LIMIT: usize = 30;

// Per-term thresholds above which a reason is attached
const INTERESTS_REASON_MIN: f64 = 10.0;
const FRESH_REASON_MIN: f64 = 20.0;
const POPULAR_REASON_MIN: f64 = 15.0;

/// Stateless scorer; cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct RecommendationEngine {
    weights: RankingWeights,
    jitter: Arc<dyn JitterSource>,
    clock: Arc<dyn Clock>,
}

impl RecommendationEngine {
    /// Engine with production weights, thread RNG jitter and the system clock
    pub fn new() -> Self {
        Self {
            weights: RankingWeights::default(),
            jitter: Arc::new(ThreadRngJitter),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the ranking weights
    pub fn with_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Replace the random source
    pub fn with_jitter(mut self, jitter: impl JitterSource + 'static) -> Self {
        self.jitter = Arc::new(jitter);
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    // =========================================================================
    // Home feed
    // =========================================================================

    /// Home-feed ranking: long-form videos not in `exclude_ids`, best first.
    pub fn get_recommendations<'v>(
        &self,
        videos: &'v [Video],
        user: &User,
        exclude_ids: &[String],
        limit: usize,
    ) -> Vec<&'v Video> {
        into_videos(self.score_recommendations(videos, user, exclude_ids, limit))
    }

    /// Same as [`get_recommendations`](Self::get_recommendations) but keeps
    /// the score and reasons of each pick.
    #[instrument(skip_all, fields(user_id = %user.id, pool = videos.len(), limit = limit))]
    pub fn score_recommendations<'v>(
        &self,
        videos: &'v [Video],
        user: &User,
        exclude_ids: &[String],
        limit: usize,
    ) -> Vec<RankedVideo<'v>> {
        let now = self.clock.now();
        let weights = &self.weights.feed;

        let candidates = FilterPipeline::new()
            .add_filter(FormatFilter::long_form())
            .add_filter(ExcludeIdsFilter::new(exclude_ids))
            .apply(videos.iter().collect());

        let signals = UserSignals::build(user, videos, weights.diversity_window);
        let noise = self.draw(candidates.len(), weights.jitter);

        let scored: Vec<RankedVideo<'v>> = candidates
            .par_iter()
            .zip(noise.par_iter())
            .map(|(&video, &noise)| self.score_feed_candidate(video, &signals, now, noise))
            .collect();

        let ranked = scoring::rank_and_select(scored, limit);
        debug!("Ranked {} home-feed videos", ranked.len());
        ranked
    }

    /// Composite home-feed score for one candidate.
    ///
    /// Terms are additive: category affinity, engagement, freshness,
    /// popularity, subscription bonus, recent-watch penalty, continue-watching
    /// boost and jitter.
    fn score_feed_candidate<'v>(
        &self,
        video: &'v Video,
        signals: &UserSignals<'_>,
        now: DateTime<Utc>,
        noise: f64,
    ) -> RankedVideo<'v> {
        let weights = &self.weights.feed;
        let mut reasons = Vec::new();

        let affinity = signals.category_share(&video.category) * weights.category_affinity;
        if affinity > INTERESTS_REASON_MIN {
            reasons.push(Reason::MatchesInterests);
        }

        let engagement = scoring::engagement_score(video, weights);

        let freshness = scoring::freshness_score(scoring::age_in_days(video.uploaded_at, now));
        if freshness >= FRESH_REASON_MIN {
            reasons.push(Reason::RecentlyUploaded);
        }

        let popularity = scoring::popularity_score(video, weights);
        if popularity > POPULAR_REASON_MIN {
            reasons.push(Reason::Popular);
        }

        let subscription = if signals.is_subscribed(&video.channel_id) {
            reasons.push(Reason::SubscribedChannel);
            weights.subscription_bonus
        } else {
            0.0
        };

        let penalty = if signals.recently_watched(&video.id) {
            weights.diversity_penalty
        } else {
            0.0
        };

        // Started but neither barely opened nor finished
        let continue_watching = match signals.completion(&video.id) {
            Some(c) if c > 0.0 && c < weights.continue_watching_max_completion => {
                reasons.push(Reason::ContinueWatching);
                weights.continue_watching_bonus
            }
            _ => 0.0,
        };

        let mut ranked = RankedVideo::new(
            video,
            affinity + engagement + freshness + popularity + subscription - penalty
                + continue_watching
                + noise,
        );
        ranked.score.reasons = reasons;
        ranked
    }

    // =========================================================================
    // Trending
    // =========================================================================

    /// Fast-rising long-form videos uploaded inside `timeframe`.
    pub fn get_trending_videos<'v>(
        &self,
        videos: &'v [Video],
        timeframe: Timeframe,
        limit: usize,
    ) -> Vec<&'v Video> {
        into_videos(self.score_trending(videos, timeframe, limit))
    }

    #[instrument(skip_all, fields(pool = videos.len(), timeframe = %timeframe, limit = limit))]
    pub fn score_trending<'v>(
        &self,
        videos: &'v [Video],
        timeframe: Timeframe,
        limit: usize,
    ) -> Vec<RankedVideo<'v>> {
        let now = self.clock.now();

        let candidates = FilterPipeline::new()
            .add_filter(FormatFilter::long_form())
            .add_filter(UploadWindowFilter::for_timeframe(now, timeframe))
            .apply(videos.iter().collect());

        let scored: Vec<RankedVideo<'v>> = candidates
            .par_iter()
            .map(|&video| {
                let age = scoring::age_in_days(video.uploaded_at, now);
                RankedVideo::new(video, scoring::trending_score(video, age))
            })
            .collect();

        let ranked = scoring::rank_and_select(scored, limit);
        debug!("Ranked {} trending videos", ranked.len());
        ranked
    }

    // =========================================================================
    // Related videos
    // =========================================================================

    /// "Up next" rail for `video`: long-form videos most like it.
    pub fn get_similar_videos<'v>(
        &self,
        video: &Video,
        all_videos: &'v [Video],
        limit: usize,
    ) -> Vec<&'v Video> {
        into_videos(self.score_similar(video, all_videos, limit))
    }

    #[instrument(skip_all, fields(video_id = %video.id, pool = all_videos.len(), limit = limit))]
    pub fn score_similar<'v>(
        &self,
        video: &Video,
        all_videos: &'v [Video],
        limit: usize,
    ) -> Vec<RankedVideo<'v>> {
        let weights = &self.weights.similar;

        let candidates = FilterPipeline::new()
            .add_filter(FormatFilter::long_form())
            .add_filter(ExcludeVideoFilter::new(&video.id))
            .apply(all_videos.iter().collect());

        let scored: Vec<RankedVideo<'v>> = candidates
            .par_iter()
            .map(|&candidate| {
                let mut score = 0.0;
                if candidate.category == video.category {
                    score += weights.same_category;
                }
                score +=
                    scoring::shared_tag_count(video, candidate) as f64 * weights.per_shared_tag;
                if candidate.channel_id == video.channel_id {
                    score += weights.same_channel;
                }
                score += scoring::popularity_closeness(
                    candidate.views,
                    video.views,
                    weights.closeness_max,
                    weights.closeness_slope,
                );
                RankedVideo::new(candidate, score)
            })
            .collect();

        let ranked = scoring::rank_and_select(scored, limit);
        debug!("Ranked {} related videos", ranked.len());
        ranked
    }

    // =========================================================================
    // Shorts
    // =========================================================================

    /// Shorts feed: short-form videos only, with a random exploration base.
    pub fn get_personalized_shorts<'v>(
        &self,
        videos: &'v [Video],
        user: &User,
        limit: usize,
    ) -> Vec<&'v Video> {
        into_videos(self.score_shorts(videos, user, limit))
    }

    #[instrument(skip_all, fields(user_id = %user.id, pool = videos.len(), limit = limit))]
    pub fn score_shorts<'v>(
        &self,
        videos: &'v [Video],
        user: &User,
        limit: usize,
    ) -> Vec<RankedVideo<'v>> {
        let weights = &self.weights.shorts;

        let candidates = FilterPipeline::new()
            .add_filter(FormatFilter::shorts_only())
            .apply(videos.iter().collect());

        // Liked categories come from the whole pool, long-form likes included
        let signals = UserSignals::build(user, videos, 0);
        let exploration = self.draw(candidates.len(), weights.exploration);

        let scored: Vec<RankedVideo<'v>> = candidates
            .par_iter()
            .zip(exploration.par_iter())
            .map(|(&short, &base)| {
                let mut reasons = Vec::new();
                let mut score = base;

                if signals.likes_category(&short.category) {
                    reasons.push(Reason::MatchesInterests);
                    score += weights.liked_category;
                }
                if signals.is_subscribed(&short.channel_id) {
                    reasons.push(Reason::SubscribedChannel);
                    score += weights.subscription_bonus;
                }
                score += scoring::safe_div(short.likes as f64, short.views as f64)
                    * weights.engagement;

                let mut ranked = RankedVideo::new(short, score);
                ranked.score.reasons = reasons;
                ranked
            })
            .collect();

        let ranked = scoring::rank_and_select(scored, limit);
        debug!("Ranked {} shorts", ranked.len());
        ranked
    }

    /// `count` sequential jitter draws scaled to `[0, scale)`
    fn draw(&self, count: usize, scale: f64) -> Vec<f64> {
        (0..count).map(|_| self.jitter.sample() * scale).collect()
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn into_videos(ranked: Vec<RankedVideo<'_>>) -> Vec<&Video> {
    ranked.into_iter().map(|r| r.video).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::jitter::{ConstantJitter, FnJitter};
    use chrono::{Duration, TimeZone};
    use data_loader::WatchRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new()
            .with_jitter(ConstantJitter(0.0))
            .with_clock(FixedClock(now()))
    }

    fn video(id: &str, category: &str, channel: &str, age_days: i64) -> Video {
        let mut v = Video::new(id, now() - Duration::days(age_days));
        v.category = category.to_string();
        v.channel_id = channel.to_string();
        v
    }

    fn short(id: &str, category: &str, channel: &str) -> Video {
        let mut v = video(id, category, channel, 0);
        v.is_short = true;
        v
    }

    fn ids(videos: &[&Video]) -> Vec<String> {
        videos.iter().map(|v| v.id.clone()).collect()
    }

    #[test]
    fn test_feed_score_terms_add_up() {
        let mut v = video("a", "Music", "c1", 3);
        v.views = 1000;
        v.likes = 100;
        v.dislikes = 25;
        v.comment_count = 50;
        let pool = vec![v, video("h", "Music", "c9", 50)];

        let mut user = User::new("u1");
        user.subscriptions.insert("c1".to_string());
        user.watch_history_detailed = vec![
            WatchRecord {
                video_id: "h".to_string(),
                watched_at: now(),
                position_ms: 1000,
                duration_ms: 1000,
            },
            WatchRecord {
                video_id: "a".to_string(),
                watched_at: now(),
                position_ms: 300,
                duration_ms: 1000,
            },
        ];

        let ranked = engine().score_recommendations(&pool, &user, &[], 10);
        let a = ranked.iter().find(|r| r.video.id == "a").unwrap();

        // affinity 2/2 * 30 + engagement 24.5 + freshness 20 + popularity
        // (0.01 * 15 + 0.01 * 10) + subscription 30 + continue 20
        let expected = 30.0 + 24.5 + 20.0 + 0.25 + 30.0 + 20.0;
        assert!((a.score.score - expected).abs() < 1e-9, "got {}", a.score.score);
        assert_eq!(
            a.score.reasons,
            vec![
                Reason::MatchesInterests,
                Reason::RecentlyUploaded,
                Reason::SubscribedChannel,
                Reason::ContinueWatching,
            ]
        );

        // "h" is finished (100%) so no continue-watching boost
        let h = ranked.iter().find(|r| r.video.id == "h").unwrap();
        assert!(!h.score.reasons.contains(&Reason::ContinueWatching));
    }

    #[test]
    fn test_recently_watched_is_penalised() {
        let pool = vec![video("a", "News", "c1", 2), video("b", "News", "c1", 2)];
        let mut user = User::new("u1");
        user.watch_history = vec!["a".to_string()];

        let ranked = engine().score_recommendations(&pool, &user, &[], 10);
        assert_eq!(ranked[0].video.id, "b");
        assert!((ranked[0].score.score - ranked[1].score.score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_only_within_recent_window() {
        let pool = vec![video("old", "News", "c1", 2), video("b", "News", "c1", 2)];
        let mut user = User::new("u1");
        user.watch_history = (0..10).map(|i| format!("x{}", i)).collect();
        user.watch_history.push("old".to_string());

        let ranked = engine().score_recommendations(&pool, &user, &[], 10);
        assert_eq!(ranked[0].score.score, ranked[1].score.score);
        assert_eq!(ranked[0].video.id, "old");
    }

    #[test]
    fn test_barely_started_gets_no_boost() {
        let pool = vec![video("a", "News", "c1", 2)];
        let mut user = User::new("u1");
        user.watch_history_detailed = vec![WatchRecord {
            video_id: "a".to_string(),
            watched_at: now(),
            position_ms: 0,
            duration_ms: 1000,
        }];

        let ranked = engine().score_recommendations(&pool, &user, &[], 10);
        assert!(ranked[0].score.reasons.iter().all(|r| *r != Reason::ContinueWatching));
    }

    #[test]
    fn test_continue_watching_stops_at_ninety_percent() {
        let pool = vec![video("a", "News", "c1", 200)];
        let reasons_at = |position_ms: u64| {
            let mut user = User::new("u1");
            user.watch_history_detailed = vec![WatchRecord {
                video_id: "a".to_string(),
                watched_at: now(),
                position_ms,
                duration_ms: 1000,
            }];
            engine().score_recommendations(&pool, &user, &[], 10)[0]
                .score
                .reasons
                .clone()
        };

        assert_eq!(reasons_at(900), vec![Reason::MatchesInterests]);
        assert_eq!(
            reasons_at(899),
            vec![Reason::MatchesInterests, Reason::ContinueWatching]
        );
    }

    #[test]
    fn test_jitter_is_scaled_and_applied() {
        let pool = vec![video("a", "News", "c1", 200)];
        let user = User::new("u1");

        let base = engine().score_recommendations(&pool, &user, &[], 1)[0].score.score;
        let jittered = engine()
            .with_jitter(ConstantJitter(0.5))
            .score_recommendations(&pool, &user, &[], 1)[0]
            .score
            .score;
        assert!((jittered - base - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_drawn_in_candidate_order() {
        // First candidate gets 0.0, second 0.99 -> b jumps ahead of a
        let calls = AtomicUsize::new(0);
        let engine = engine().with_jitter(FnJitter(move || {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                0.0
            } else {
                0.99
            }
        }));
        let pool = vec![video("a", "News", "c1", 200), video("b", "News", "c1", 200)];

        let ranked = engine.get_recommendations(&pool, &User::new("u1"), &[], 10);
        assert_eq!(ids(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn test_trending_window_and_order() {
        let mut slow = video("slow", "Gaming", "c1", 5);
        slow.views = 1000;
        slow.likes = 10;
        let mut fast = video("fast", "Gaming", "c2", 1);
        fast.views = 5000;
        fast.likes = 500;
        fast.comment_count = 20;
        let mut stale = video("stale", "Gaming", "c3", 20);
        stale.views = 10_000_000;
        stale.likes = 1_000_000;
        let mut short_clip = short("s", "Gaming", "c4");
        short_clip.views = 10_000;
        short_clip.likes = 5_000;
        let pool = vec![slow, fast, stale, short_clip];

        let week = engine().get_trending_videos(&pool, Timeframe::Week, DEFAULT_TRENDING_LIMIT);
        assert_eq!(ids(&week), vec!["fast", "slow"]);

        let month = engine().get_trending_videos(&pool, Timeframe::Month, DEFAULT_TRENDING_LIMIT);
        assert_eq!(month[0].id, "stale");

        let day = engine().get_trending_videos(&pool, Timeframe::Day, DEFAULT_TRENDING_LIMIT);
        assert_eq!(ids(&day), vec!["fast"]);
    }

    #[test]
    fn test_similar_scoring() {
        let mut reference = video("ref", "Tech", "c1", 10);
        reference.tags = vec!["rust".into(), "async".into()];
        reference.views = 1000;

        let mut twin = video("twin", "Tech", "c1", 10);
        twin.tags = vec!["rust".into(), "async".into(), "tokio".into()];
        twin.views = 1000;

        let mut cousin = video("cousin", "Tech", "c2", 10);
        cousin.tags = vec!["python".into()];
        cousin.views = 1000;

        let stranger = video("stranger", "Cooking", "c3", 10);

        let pool = vec![stranger, cousin, reference.clone(), twin];
        let ranked = engine().score_similar(&reference, &pool, DEFAULT_SIMILAR_LIMIT);

        let order: Vec<&str> = ranked.iter().map(|r| r.video.id.as_str()).collect();
        assert_eq!(order, vec!["twin", "cousin", "stranger"]);
        // 40 + 2 * 15 + 30 + 10
        assert!((ranked[0].score.score - 110.0).abs() < 1e-9);
        // 40 + closeness 10
        assert!((ranked[1].score.score - 50.0).abs() < 1e-9);
        // closeness: |log10(1) - log10(1001)| ~= 3.0004 -> 10 - 6.0009
        assert!((ranked[2].score.score - (10.0 - 2.0 * 1001f64.log10())).abs() < 1e-9);
    }

    #[test]
    fn test_shorts_scoring() {
        let mut liked_long = video("liked", "Comedy", "c9", 3);
        liked_long.views = 10;

        let mut funny = short("funny", "Comedy", "c1");
        funny.views = 100;
        funny.likes = 40;
        let followed = short("followed", "Cooking", "c2");
        let plain = short("plain", "Cooking", "c3");

        let mut user = User::new("u1");
        user.liked_videos.insert("liked".to_string());
        user.liked_videos.insert("deleted".to_string());
        user.subscriptions.insert("c2".to_string());

        let pool = vec![plain, liked_long, followed, funny];
        let ranked = engine().score_shorts(&pool, &user, DEFAULT_SHORTS_LIMIT);

        let order: Vec<&str> = ranked.iter().map(|r| r.video.id.as_str()).collect();
        assert_eq!(order, vec!["funny", "followed", "plain"]);
        // liked category 40 + 0.4 * 25
        assert!((ranked[0].score.score - 50.0).abs() < 1e-9);
        assert_eq!(ranked[1].score.score, 35.0);
        assert_eq!(ranked[2].score.score, 0.0);
    }

    #[test]
    fn test_exploration_base_bounds() {
        let pool = vec![short("s", "Cooking", "c1")];
        let user = User::new("u1");
        let ranked = engine()
            .with_jitter(ConstantJitter(0.5))
            .score_shorts(&pool, &user, 10);
        assert_eq!(ranked[0].score.score, 15.0);
    }

    #[test]
    fn test_custom_weights() {
        let mut weights = RankingWeights::default();
        weights.shorts.subscription_bonus = 0.0;
        weights.shorts.liked_category = 0.0;

        let mut user = User::new("u1");
        user.subscriptions.insert("c1".to_string());
        let pool = vec![short("s", "Cooking", "c1")];

        let ranked = engine().with_weights(weights).score_shorts(&pool, &user, 10);
        assert_eq!(ranked[0].score.score, 0.0);
    }

    #[test]
    fn test_empty_pool() {
        let engine = engine();
        let user = User::new("u1");
        let reference = video("r", "Tech", "c1", 1);

        assert!(engine.get_recommendations(&[], &user, &[], 20).is_empty());
        assert!(engine.get_trending_videos(&[], Timeframe::Week, 20).is_empty());
        assert!(engine.get_similar_videos(&reference, &[], 10).is_empty());
        assert!(engine.get_personalized_shorts(&[], &user, 30).is_empty());
    }

    #[test]
    fn test_zero_limit() {
        let pool = vec![video("a", "News", "c1", 2)];
        let user = User::new("u1");
        assert!(engine().get_recommendations(&pool, &user, &[], 0).is_empty());
    }
}
