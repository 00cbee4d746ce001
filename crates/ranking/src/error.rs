//! Error types for the ranking crate.
//!
//! Ranking itself never fails; these cover the configuration edges
//! (weights files, timeframe names coming from a CLI or query string).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    /// Timeframe name other than day / week / month
    #[error("Unknown timeframe: {0} (expected day, week or month)")]
    UnknownTimeframe(String),

    /// Weights file could not be read
    #[error("Failed to read weights file {path}: {source}")]
    WeightsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Weights file is not valid JSON for `RankingWeights`
    #[error("Invalid weights file {path}: {source}")]
    WeightsFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, RankingError>;
