//! The FilterPipeline chains filters together.

use crate::traits::Filter;
use data_loader::Video;
use tracing::debug;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(FormatFilter::long_form())
///     .add_filter(ExcludeIdsFilter::new(&exclude_ids));
///
/// let candidates = pipeline.apply(videos.iter().collect());
/// ```
///
/// The lifetime lets filters borrow their parameters (an exclusion list, a
/// reference video) from the caller instead of copying them.
pub struct FilterPipeline<'f> {
    filters: Vec<Box<dyn Filter + 'f>>,
}

impl<'f> FilterPipeline<'f> {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'f) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Apply all filters in sequence, logging counts around each one.
    pub fn apply<'v>(&self, candidates: Vec<&'v Video>) -> Vec<&'v Video> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current);
            debug!(
                "Filter {} kept {} of {} candidates",
                filter.name(),
                current.len(),
                before
            );
        }
        current
    }
}

impl Default for FilterPipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}
