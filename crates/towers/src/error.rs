//! Unified error type for the Turn Table Towers crates.

use towers_engine::EngineError;
use towers_protocol::ProtocolError;
use towers_service::ServiceError;
use towers_store::StoreError;

/// Top-level error that wraps every crate-specific error.
///
/// With the `towers` facade you handle this one type; `?` converts the
/// sub-crate errors through the generated `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum TowersError {
    /// A state blob could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game rule was broken.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A request failed in the service pipeline.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl TowersError {
    /// Whether the caller may resend the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service(err) => err.is_retryable(),
            Self::Store(StoreError::Unavailable(_)) => true,
            _ => false,
        }
    }
}
