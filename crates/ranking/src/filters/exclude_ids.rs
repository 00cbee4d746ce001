//! Filter to drop videos the caller has already shown.
//!
//! Feed screens pass the ids currently on screen so a refresh doesn't
//! repeat them.

use crate::traits::Filter;
use data_loader::Video;
use std::collections::HashSet;

/// Removes candidates whose id is in the exclusion list.
///
/// ## Algorithm
/// The list is copied into a HashSet of borrowed ids for O(1) lookups.
pub struct ExcludeIdsFilter<'e> {
    ids: HashSet<&'e str>,
}

impl<'e> ExcludeIdsFilter<'e> {
    pub fn new(ids: &'e [String]) -> Self {
        Self {
            ids: ids.iter().map(String::as_str).collect(),
        }
    }
}

impl Filter for ExcludeIdsFilter<'_> {
    fn name(&self) -> &str {
        "ExcludeIdsFilter"
    }

    fn apply<'v>(&self, candidates: Vec<&'v Video>) -> Vec<&'v Video> {
        if self.ids.is_empty() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|video| !self.ids.contains(video.id.as_str()))
            .collect()
    }
}
