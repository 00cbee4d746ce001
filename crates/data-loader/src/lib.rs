//! # Data Loader Crate
//!
//! Loads and indexes the video catalog that feeds the ranking engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Video, User, WatchRecord, VideoCatalog)
//! - **parser**: Decode the JSON exports into Rust structs
//! - **index**: Build and validate a catalog from a directory
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::VideoCatalog;
//! use std::path::Path;
//!
//! let catalog = VideoCatalog::load_from_files(Path::new("data"))?;
//!
//! let user = catalog.get_user("u1").unwrap();
//! println!("{} follows {} channels", user.id, user.subscriptions.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{
    // Type aliases
    ChannelId,
    UserId,
    VideoId,
    // Core types
    User,
    Video,
    VideoCatalog,
    WatchRecord,
    WATCH_HISTORY_CAP,
};
