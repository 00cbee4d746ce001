//! Tunable ranking weights.
//!
//! `Default` reproduces the production weights. Every field is optional in a
//! weights file, so a file only needs to list what it overrides:
//!
//! ```json
//! { "feed": { "subscription_bonus": 45.0 }, "shorts": { "exploration": 10.0 } }
//! ```

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Weights for the home feed (`get_recommendations`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedWeights {
    /// Full category-affinity bonus when every history entry shares the category
    pub category_affinity: f64,
    /// Scale for (likes + 0.1 * views) / views
    pub view_engagement: f64,
    /// Scale for likes / (likes + dislikes)
    pub like_ratio: f64,
    /// Scale for comments / views
    pub comment_density: f64,
    /// Popularity share coming from views, saturating at `views_saturation`
    pub popularity_views: f64,
    pub views_saturation: f64,
    /// Popularity share coming from likes, saturating at `likes_saturation`
    pub popularity_likes: f64,
    pub likes_saturation: f64,
    pub subscription_bonus: f64,
    /// Subtracted when the video sits in the recent-watch window
    pub diversity_penalty: f64,
    /// How many of the most recent watch-history entries count as "just watched"
    pub diversity_window: usize,
    pub continue_watching_bonus: f64,
    /// Completion at or above this counts as finished
    pub continue_watching_max_completion: f64,
    /// Upper bound of the uniform jitter
    pub jitter: f64,
}

impl Default for FeedWeights {
    fn default() -> Self {
        Self {
            category_affinity: 30.0,
            view_engagement: 20.0,
            like_ratio: 25.0,
            comment_density: 10.0,
            popularity_views: 15.0,
            views_saturation: 100_000.0,
            popularity_likes: 10.0,
            likes_saturation: 10_000.0,
            subscription_bonus: 30.0,
            diversity_penalty: 50.0,
            diversity_window: 10,
            continue_watching_bonus: 20.0,
            continue_watching_max_completion: 0.9,
            jitter: 5.0,
        }
    }
}

/// Weights for the related-videos rail (`get_similar_videos`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarWeights {
    pub same_category: f64,
    /// Added once per shared tag, uncapped
    pub per_shared_tag: f64,
    pub same_channel: f64,
    /// Closeness bonus when view counts have the same order of magnitude
    pub closeness_max: f64,
    /// Bonus lost per decade of view-count difference
    pub closeness_slope: f64,
}

impl Default for SimilarWeights {
    fn default() -> Self {
        Self {
            same_category: 40.0,
            per_shared_tag: 15.0,
            same_channel: 30.0,
            closeness_max: 10.0,
            closeness_slope: 2.0,
        }
    }
}

/// Weights for the shorts feed (`get_personalized_shorts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortsWeights {
    /// Upper bound of the random exploration base
    pub exploration: f64,
    pub liked_category: f64,
    pub subscription_bonus: f64,
    /// Scale for likes / views
    pub engagement: f64,
}

impl Default for ShortsWeights {
    fn default() -> Self {
        Self {
            exploration: 30.0,
            liked_category: 40.0,
            subscription_bonus: 35.0,
            engagement: 25.0,
        }
    }
}

/// All ranking weights, one group per surface.
///
/// Trending has no weights: its score is a fixed product of view velocity
/// and engagement rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub feed: FeedWeights,
    pub similar: SimilarWeights,
    pub shorts: ShortsWeights,
}

impl RankingWeights {
    /// Load weights from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| RankingError::WeightsIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|e| match e {
            RankingError::WeightsFormat { source, .. } => RankingError::WeightsFormat {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse weights from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| RankingError::WeightsFormat {
            path: "<memory>".to_string(),
            source,
        })
    }
}
