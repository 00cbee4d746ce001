//! Error types for the data-loader crate.
//!
//! Everything that can go wrong while reading a catalog directory lands in
//! one enum so callers can match on the failure or just bubble it up with `?`.

use thiserror::Error;

/// Errors that can occur while loading and validating the video catalog
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A JSON document couldn't be decoded
    ///
    /// serde_json reports the line where decoding stopped, which we keep
    /// so a broken export can be fixed by hand.
    #[error("JSON error at line {line} in {file}: {reason}")]
    JsonError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., a user liking a deleted video)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
