//! Filter to drop the video currently being watched from its own
//! related-videos rail.

use crate::traits::Filter;
use data_loader::Video;

pub struct ExcludeVideoFilter<'r> {
    video_id: &'r str,
}

impl<'r> ExcludeVideoFilter<'r> {
    pub fn new(video_id: &'r str) -> Self {
        Self { video_id }
    }
}

impl Filter for ExcludeVideoFilter<'_> {
    fn name(&self) -> &str {
        "ExcludeVideoFilter"
    }

    fn apply<'v>(&self, candidates: Vec<&'v Video>) -> Vec<&'v Video> {
        candidates
            .into_iter()
            .filter(|video| video.id != self.video_id)
            .collect()
    }
}
