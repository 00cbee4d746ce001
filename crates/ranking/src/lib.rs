//! Ranking engine for the video catalog.
//!
//! This crate provides:
//! - Filter trait, concrete filters and FilterPipeline for narrowing the pool
//! - Scoring terms (engagement, freshness, popularity, trending, similarity)
//! - RecommendationEngine with the four surfaces: home feed, trending,
//!   related videos and shorts
//! - Tunable weights loaded from JSON, plus injectable jitter and clock
//!
//! ## Example Usage
//! ```ignore
//! use ranking::{RecommendationEngine, SeededJitter, Timeframe};
//!
//! let engine = RecommendationEngine::new().with_jitter(SeededJitter::new(7));
//!
//! let feed = engine.get_recommendations(catalog.videos(), user, &[], 20);
//! let trending = engine.get_trending_videos(catalog.videos(), Timeframe::Week, 20);
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter_pipeline;
pub mod filters;
pub mod jitter;
pub mod scoring;
pub mod signals;
pub mod timeframe;
pub mod traits;

// Re-export main types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FeedWeights, RankingWeights, ShortsWeights, SimilarWeights};
pub use engine::{
    DEFAULT_RECOMMENDATION_LIMIT, DEFAULT_SHORTS_LIMIT, DEFAULT_SIMILAR_LIMIT,
    DEFAULT_TRENDING_LIMIT, RecommendationEngine,
};
pub use error::{RankingError, Result};
pub use filter_pipeline::FilterPipeline;
pub use jitter::{ConstantJitter, FnJitter, JitterSource, SeededJitter, ThreadRngJitter};
pub use scoring::{RankedVideo, Reason, RecommendationScore};
pub use timeframe::Timeframe;
pub use traits::Filter;
