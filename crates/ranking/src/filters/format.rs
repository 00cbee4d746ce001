//! Filter that separates long-form videos from shorts.
//!
//! The home feed, trending shelf and related rail are long-form only; the
//! shorts feed is shorts only. The two pools never mix.

use crate::traits::Filter;
use data_loader::Video;

/// Keeps only one format.
pub struct FormatFilter {
    shorts: bool,
}

impl FormatFilter {
    /// Keep long-form videos, drop shorts
    pub fn long_form() -> Self {
        Self { shorts: false }
    }

    /// Keep shorts, drop long-form videos
    pub fn shorts_only() -> Self {
        Self { shorts: true }
    }
}

impl Filter for FormatFilter {
    fn name(&self) -> &str {
        if self.shorts {
            "FormatFilter(shorts)"
        } else {
            "FormatFilter(long-form)"
        }
    }

    fn apply<'v>(&self, candidates: Vec<&'v Video>) -> Vec<&'v Video> {
        candidates
            .into_iter()
            .filter(|video| video.is_short == self.shorts)
            .collect()
    }
}
