//! Error types for spatial querying.

use thiserror::Error;

/// Spatial store and query errors.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// The store did not answer within the caller's deadline. Treated as
    /// a per-kind partial failure by the pipeline.
    #[error("spatial query timed out: {0}")]
    Timeout(String),

    /// Store-side query failure. Treated as a per-kind partial failure.
    #[error("spatial backend error: {0}")]
    Backend(String),

    /// The store is unreachable. Aborts the whole resolution call.
    #[error("spatial store unavailable: {0}")]
    Unavailable(String),

    /// A geometry that cannot be processed (empty, not a surface where
    /// one is required).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
