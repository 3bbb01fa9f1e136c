//! Error type for the resolution pipeline.

use thiserror::Error;

/// Pipeline errors, aggregated from the layers below.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error(transparent)]
    Core(#[from] conflate_core::CoreError),

    #[error(transparent)]
    Vocab(#[from] conflate_vocab::VocabError),

    #[error(transparent)]
    Spatial(#[from] conflate_spatial::SpatialError),
}

/// Result type for pipeline operations.
pub type Result<T, E = MatchError> = std::result::Result<T, E>;
