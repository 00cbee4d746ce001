//! Feed crate for the video ranking engine.
//!
//! This crate contains the async orchestrator that resolves user and video
//! ids against a shared catalog and serves each ranking surface.

pub mod orchestrator;

pub use orchestrator::{FeedBundle, FeedItem, FeedOrchestrator};
