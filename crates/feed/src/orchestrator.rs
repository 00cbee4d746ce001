//! # Feed Orchestrator
//!
//! Serves the ranking surfaces by id:
//! 1. Resolve the user / reference video against the shared catalog
//! 2. Run the engine on the blocking pool (scoring is CPU-bound and uses Rayon)
//! 3. Flatten the ranked videos into `FeedItem`s for the caller
//!
//! `feed_bundle` fans out home, trending and shorts with `tokio::join!` so a
//! full landing page costs roughly one surface of latency.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use data_loader::{ChannelId, VideoCatalog, VideoId};
use ranking::{
    DEFAULT_RECOMMENDATION_LIMIT, DEFAULT_SHORTS_LIMIT, DEFAULT_TRENDING_LIMIT, RankedVideo, Reason,
    RecommendationEngine, Timeframe,
};

/// One entry of a rendered feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub video_id: VideoId,
    pub title: String,
    pub channel_id: ChannelId,
    pub is_short: bool,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

impl From<RankedVideo<'_>> for FeedItem {
    fn from(ranked: RankedVideo<'_>) -> Self {
        Self {
            video_id: ranked.score.video_id,
            title: ranked.video.title.clone(),
            channel_id: ranked.video.channel_id.clone(),
            is_short: ranked.video.is_short,
            score: ranked.score.score,
            reasons: ranked.score.reasons,
        }
    }
}

/// Everything a landing page needs for one user
#[derive(Debug, Clone, Serialize)]
pub struct FeedBundle {
    pub home: Vec<FeedItem>,
    pub trending: Vec<FeedItem>,
    pub shorts: Vec<FeedItem>,
}

/// Async facade over a shared catalog and a ranking engine
#[derive(Clone)]
pub struct FeedOrchestrator {
    catalog: Arc<VideoCatalog>,
    engine: RecommendationEngine,
}

impl FeedOrchestrator {
    pub fn new(catalog: Arc<VideoCatalog>, engine: RecommendationEngine) -> Self {
        Self { catalog, engine }
    }

    pub fn catalog(&self) -> &Arc<VideoCatalog> {
        &self.catalog
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Home feed for `user_id`, skipping anything in `exclude`
    pub async fn home_feed(
        &self,
        user_id: &str,
        exclude: Vec<VideoId>,
        limit: usize,
    ) -> Result<Vec<FeedItem>> {
        let start_time = Instant::now();
        let user_id = user_id.to_string();

        let items: Vec<FeedItem> = self
            .run_blocking("Home feed", move |catalog, engine| {
                let user = catalog
                    .require_user(&user_id)
                    .context("Failed to build home feed")?;
                let ranked = engine.score_recommendations(catalog.videos(), user, &exclude, limit);
                Ok(ranked.into_iter().map(FeedItem::from).collect())
            })
            .await?;

        info!(
            "Home feed: {} items in {:.2?}",
            items.len(),
            start_time.elapsed()
        );
        Ok(items)
    }

    /// Trending shelf for `timeframe`
    pub async fn trending(&self, timeframe: Timeframe, limit: usize) -> Result<Vec<FeedItem>> {
        let start_time = Instant::now();

        let items: Vec<FeedItem> = self
            .run_blocking("Trending", move |catalog, engine| {
                let ranked = engine.score_trending(catalog.videos(), timeframe, limit);
                Ok(ranked.into_iter().map(FeedItem::from).collect())
            })
            .await?;

        info!(
            "Trending ({}): {} items in {:.2?}",
            timeframe,
            items.len(),
            start_time.elapsed()
        );
        Ok(items)
    }

    /// Related videos to show next to `video_id`
    pub async fn up_next(&self, video_id: &str, limit: usize) -> Result<Vec<FeedItem>> {
        let start_time = Instant::now();
        let video_id = video_id.to_string();

        let items: Vec<FeedItem> = self
            .run_blocking("Up next", move |catalog, engine| {
                let reference = catalog
                    .require_video(&video_id)
                    .context("Failed to find related videos")?;
                let ranked = engine.score_similar(reference, catalog.videos(), limit);
                Ok(ranked.into_iter().map(FeedItem::from).collect())
            })
            .await?;

        info!(
            "Up next: {} items in {:.2?}",
            items.len(),
            start_time.elapsed()
        );
        Ok(items)
    }

    /// Shorts feed for `user_id`
    pub async fn shorts_feed(&self, user_id: &str, limit: usize) -> Result<Vec<FeedItem>> {
        let start_time = Instant::now();
        let user_id = user_id.to_string();

        let items: Vec<FeedItem> = self
            .run_blocking("Shorts", move |catalog, engine| {
                let user = catalog
                    .require_user(&user_id)
                    .context("Failed to build shorts feed")?;
                let ranked = engine.score_shorts(catalog.videos(), user, limit);
                Ok(ranked.into_iter().map(FeedItem::from).collect())
            })
            .await?;

        info!(
            "Shorts: {} items in {:.2?}",
            items.len(),
            start_time.elapsed()
        );
        Ok(items)
    }

    /// Home, weekly trending and shorts for `user_id`, computed concurrently
    pub async fn feed_bundle(&self, user_id: &str) -> Result<FeedBundle> {
        let start_time = Instant::now();

        let (home, trending, shorts) = tokio::join!(
            self.home_feed(user_id, Vec::new(), DEFAULT_RECOMMENDATION_LIMIT),
            self.trending(Timeframe::Week, DEFAULT_TRENDING_LIMIT),
            self.shorts_feed(user_id, DEFAULT_SHORTS_LIMIT)
        );

        let bundle = FeedBundle {
            home: home?,
            trending: trending?,
            shorts: shorts?,
        };

        info!(
            "Feed bundle for user {} assembled in {:.2?}",
            user_id,
            start_time.elapsed()
        );
        Ok(bundle)
    }

    /// Run `work` on the blocking pool with its own handles to the catalog and engine
    async fn run_blocking<T, F>(&self, label: &'static str, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&VideoCatalog, &RecommendationEngine) -> Result<T> + Send + 'static,
    {
        let catalog = self.catalog.clone();
        let engine = self.engine.clone();

        tokio::task::spawn_blocking(move || work(catalog.as_ref(), &engine))
            .await
            .with_context(|| format!("{} task panicked", label))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use data_loader::{User, Video};
    use ranking::{ConstantJitter, FixedClock};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
    }

    fn video(id: &str, category: &str, channel: &str, age_days: i64, is_short: bool) -> Video {
        let mut v = Video::new(id, now() - Duration::days(age_days));
        v.title = format!("Title {}", id);
        v.category = category.to_string();
        v.channel_id = channel.to_string();
        v.views = 1_000 * (age_days as u64 + 1);
        v.likes = 50 * (age_days as u64 + 1);
        v.is_short = is_short;
        v
    }

    fn build_test_catalog() -> Arc<VideoCatalog> {
        let mut catalog = VideoCatalog::new();

        catalog.insert_video(video("v1", "Music", "c1", 0, false));
        catalog.insert_video(video("v2", "Music", "c2", 3, false));
        catalog.insert_video(video("v3", "Gaming", "c1", 10, false));
        catalog.insert_video(video("v4", "Gaming", "c3", 40, false));
        catalog.insert_video(video("s1", "Music", "c1", 1, true));
        catalog.insert_video(video("s2", "Gaming", "c2", 2, true));

        let mut user = User::new("u1");
        user.name = "Ada".to_string();
        user.subscriptions.insert("c1".to_string());
        user.liked_videos.insert("v3".to_string());
        user.record_watch("v2", 30_000, 60_000, now());
        catalog.insert_user(user);

        Arc::new(catalog)
    }

    fn build_orchestrator() -> FeedOrchestrator {
        let engine = RecommendationEngine::new()
            .with_jitter(ConstantJitter(0.0))
            .with_clock(FixedClock(now()));
        FeedOrchestrator::new(build_test_catalog(), engine)
    }

    // ============================================================================
    // Surface Tests
    // ============================================================================

    #[tokio::test]
    async fn test_home_feed() {
        let orchestrator = build_orchestrator();

        let items = orchestrator
            .home_feed("u1", vec!["v1".to_string()], 10)
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| !i.is_short));
        assert!(items.iter().all(|i| i.video_id != "v1"));
        for pair in items.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }

        let v2 = items.iter().find(|i| i.video_id == "v2").unwrap();
        assert!(v2.reasons.contains(&Reason::ContinueWatching));
        assert_eq!(v2.title, "Title v2");
    }

    #[tokio::test]
    async fn test_home_feed_unknown_user() {
        let orchestrator = build_orchestrator();

        let result = orchestrator.home_feed("nobody", Vec::new(), 10).await;
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("nobody"));
    }

    #[tokio::test]
    async fn test_trending() {
        let orchestrator = build_orchestrator();

        let items = orchestrator.trending(Timeframe::Week, 10).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.video_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"v1"));
        assert!(ids.contains(&"v2"));
    }

    #[tokio::test]
    async fn test_up_next() {
        let orchestrator = build_orchestrator();

        let items = orchestrator.up_next("v3", 10).await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.video_id != "v3"));
        assert!(items.iter().all(|i| !i.is_short));
    }

    #[tokio::test]
    async fn test_up_next_unknown_video() {
        let orchestrator = build_orchestrator();
        assert!(orchestrator.up_next("missing", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_shorts_feed() {
        let orchestrator = build_orchestrator();

        let items = orchestrator.shorts_feed("u1", 10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.is_short));
        // s2: liked category (Gaming via v3) outweighs s1: subscribed channel
        assert_eq!(items[0].video_id, "s2");
        assert_eq!(items[0].reasons, vec![Reason::MatchesInterests]);
        assert_eq!(items[1].reasons, vec![Reason::SubscribedChannel]);
    }

    #[tokio::test]
    async fn test_feed_bundle() {
        let orchestrator = build_orchestrator();

        let bundle = orchestrator.feed_bundle("u1").await.unwrap();
        assert_eq!(bundle.home.len(), 4);
        assert_eq!(bundle.trending.len(), 2);
        assert_eq!(bundle.shorts.len(), 2);
    }

    #[tokio::test]
    async fn test_feed_bundle_unknown_user() {
        let orchestrator = build_orchestrator();
        assert!(orchestrator.feed_bundle("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let orchestrator = build_orchestrator();

        let mut handles = vec![];
        for _ in 0..8 {
            let orchestrator = orchestrator.clone();
            handles.push(tokio::spawn(async move {
                orchestrator.home_feed("u1", Vec::new(), 2).await
            }));
        }

        let first = handles.remove(0).await.unwrap().unwrap();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), first);
        }
    }
}
