//! Core traits for the candidate filtering stage.
//!
//! Each surface starts by narrowing the video pool (drop shorts, drop
//! excluded ids, drop stale uploads...). Filters implement [`Filter`] so the
//! surfaces compose them into a [`FilterPipeline`](crate::FilterPipeline)
//! instead of hand-writing the same `retain` calls four times.

use data_loader::Video;

/// Core trait for filtering candidates.
///
/// ## Design Note
/// - Candidates are borrowed from the caller's pool; filters never clone videos
/// - Filters take ownership of the Vec and return the survivors in input order,
///   which keeps the stable tie-break intact
/// - Filtering cannot fail: a filter that can't decide keeps the candidate
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply<'v>(&self, candidates: Vec<&'v Video>) -> Vec<&'v Video>;
}
