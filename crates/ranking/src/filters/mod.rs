//! Filter implementations for the candidate pipeline.
//!
//! This module contains the concrete filters the four surfaces compose
//! into a FilterPipeline.

pub mod exclude_ids;
pub mod exclude_video;
pub mod format;
pub mod upload_window;

// Re-export for convenience
pub use exclude_ids::ExcludeIdsFilter;
pub use exclude_video::ExcludeVideoFilter;
pub use format::FormatFilter;
pub use upload_window::UploadWindowFilter;
