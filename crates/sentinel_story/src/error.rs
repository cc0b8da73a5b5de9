//! Error types for the Sentinel story transform.

use thiserror::Error;

/// A specialized `Result` type for story operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while deriving a story.
///
/// Unresolved node references and unparseable timestamps are not errors:
/// they degrade the narrative (absent node fields, skipped timeline events)
/// instead of aborting it.
#[derive(Error, Debug)]
pub enum Error {
    /// The graph or the explanation document was absent (`null`).
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    /// The temporal attention vector has fewer weights than the summary reports.
    #[error("Temporal attention too short: expected at least {expected} weights, got {actual}")]
    ShortTemporalVector {
        /// Number of weights the summary needs.
        expected: usize,
        /// Number of weights actually present.
        actual: usize,
    },

    /// A document was present but could not be decoded into the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
