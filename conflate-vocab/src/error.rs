//! Error types for vocabulary resolution.

use conflate_core::CoreError;
use thiserror::Error;

/// Vocabulary resolution errors.
///
/// Almost nothing in the type walk is fatal: unfetchable or missing
/// types are treated as empty subtrees and logged. The exceptions are
/// redirect loops and hard store failures, which surface here.
#[derive(Error, Debug)]
pub enum VocabError {
    /// Entity store failure that is not a missing item.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for vocabulary operations.
pub type Result<T, E = VocabError> = std::result::Result<T, E>;
