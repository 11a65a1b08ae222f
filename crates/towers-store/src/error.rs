//! Error types for the persistence layer.

use towers_protocol::{GameId, ProtocolError};

/// Errors a [`GameStore`](crate::GameStore) can return.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No game is stored under this id.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// `create` was called for an id that is already taken.
    #[error("game {0} already exists")]
    AlreadyExists(GameId),

    /// The conditional write lost: someone committed since the caller's
    /// read. The caller must reload and decide again.
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// The backing storage could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A state blob could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] ProtocolError),
}
