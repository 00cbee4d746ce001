//! Filter for the trending recency window.
//!
//! Drops anything uploaded before the cutoff so old viral videos don't
//! camp on the trending shelf forever.

use crate::timeframe::Timeframe;
use crate::traits::Filter;
use chrono::{DateTime, Duration, Utc};
use data_loader::Video;

/// Keeps candidates uploaded at or after `cutoff`.
pub struct UploadWindowFilter {
    cutoff: DateTime<Utc>,
}

impl UploadWindowFilter {
    pub fn since(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// Window ending at `now` and spanning the timeframe
    pub fn for_timeframe(now: DateTime<Utc>, timeframe: Timeframe) -> Self {
        Self::since(now - Duration::days(timeframe.cutoff_days()))
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }
}

impl Filter for UploadWindowFilter {
    fn name(&self) -> &str {
        "UploadWindowFilter"
    }

    fn apply<'v>(&self, candidates: Vec<&'v Video>) -> Vec<&'v Video> {
        candidates
            .into_iter()
            .filter(|video| video.uploaded_at >= self.cutoff)
            .collect()
    }
}
