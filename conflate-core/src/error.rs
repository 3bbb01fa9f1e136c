//! Error types shared across the conflate workspace.

use crate::item::{ItemId, PropertyId};
use thiserror::Error;

/// Core errors.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Requested item does not exist or was tombstoned.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// A fetched entity redirected to a target that redirected again.
    #[error("redirect loop: {from} -> {to}")]
    RedirectLoop { from: ItemId, to: ItemId },

    /// An upsert carried a revision that does not advance the stored one.
    #[error("stale revision for {id}: stored {stored}, offered {offered}")]
    StaleRevision {
        id: ItemId,
        stored: u64,
        offered: u64,
    },

    /// A statement lacks the expected value shape.
    #[error("malformed statement for {property}: {detail}")]
    MalformedStatement {
        property: PropertyId,
        detail: String,
    },

    /// External collaborator failure (store unreachable, RPC error).
    #[error("backend error: {0}")]
    Backend(String),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
