//! Error types for the service layer.

use towers_engine::EngineError;
use towers_protocol::GameId;
use towers_store::StoreError;

/// Errors returned by [`GameService`](crate::GameService).
///
/// Rule violations pass through from the engine unchanged. Store
/// failures are folded into the two kinds a caller can act on:
/// [`ConcurrentModification`](Self::ConcurrentModification) (reload and
/// decide again) and [`StorageUnavailable`](Self::StorageUnavailable)
/// (retry later).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The action broke a game rule. Nothing was written.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Another action was committed between this request's read and its
    /// write. The action was not applied and must be re-derived from
    /// fresh state, never blindly resubmitted.
    #[error("game was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification { expected: u64, actual: u64 },

    /// No game has this id.
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// A game with this id already exists.
    #[error("game {0} already exists")]
    GameAlreadyExists(GameId),

    /// The persistence collaborator failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The service configuration is unusable.
    #[error("invalid service config: {0}")]
    InvalidConfig(String),
}

impl ServiceError {
    /// Whether the caller may resubmit the same request unchanged.
    ///
    /// Only storage outages qualify. A concurrent modification means the
    /// game moved on, so the old decision may no longer be legal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::GameNotFound(id),
            StoreError::AlreadyExists(id) => Self::GameAlreadyExists(id),
            StoreError::VersionConflict { expected, actual } => {
                Self::ConcurrentModification { expected, actual }
            }
            StoreError::Unavailable(reason) => Self::StorageUnavailable(reason),
            StoreError::Codec(err) => Self::StorageUnavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_becomes_concurrent_modification() {
        let err: ServiceError = StoreError::VersionConflict {
            expected: 4,
            actual: 5,
        }
        .into();
        assert!(matches!(
            err,
            ServiceError::ConcurrentModification {
                expected: 4,
                actual: 5
            }
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unavailable_becomes_retryable_storage_error() {
        let err: ServiceError = StoreError::Unavailable("db down".into()).into();
        assert!(matches!(err, ServiceError::StorageUnavailable(ref r) if r == "db down"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_keeps_game_id() {
        let err: ServiceError = StoreError::NotFound(GameId::from("g7")).into();
        assert!(matches!(err, ServiceError::GameNotFound(ref id) if id.as_str() == "g7"));
    }

    #[test]
    fn test_engine_errors_pass_through_and_are_not_retryable() {
        let err: ServiceError = EngineError::DeckExhausted.into();
        assert!(matches!(err, ServiceError::Engine(EngineError::DeckExhausted)));
        assert_eq!(err.to_string(), "the deck is exhausted");
        assert!(!err.is_retryable());
    }
}
