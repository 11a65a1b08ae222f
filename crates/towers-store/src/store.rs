//! The persistence hook the service talks to.
//!
//! The engine never touches a database. It reads a [`Versioned`] state,
//! computes a new one, and asks the store to write it back only if the
//! version it read is still current. Whatever sits behind [`GameStore`]
//! (a SQL row with a version column, a key-value store with
//! compare-and-swap, or [`MemoryStore`](crate::MemoryStore) in tests)
//! must make that conditional write atomic.

use std::future::Future;

use towers_engine::GameState;
use towers_protocol::GameId;

use crate::StoreError;

/// A state snapshot together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub version: u64,
    pub state: GameState,
}

/// Versioned storage for game states.
///
/// The store owns versioning: `create` assigns version 1 and every
/// successful `commit` assigns `expected_version + 1`. The assigned
/// version is also written into the returned state's `version` field.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` so one store can be shared by every request
/// task for the life of the process.
pub trait GameStore: Send + Sync + 'static {
    /// Stores the first state of a new game.
    ///
    /// # Errors
    /// `AlreadyExists` if the id is taken.
    fn create(
        &self,
        game_id: &GameId,
        state: GameState,
    ) -> impl Future<Output = Result<Versioned, StoreError>> + Send;

    /// Reads the current state and its version.
    ///
    /// # Errors
    /// `NotFound` if no game has this id.
    fn load(&self, game_id: &GameId) -> impl Future<Output = Result<Versioned, StoreError>> + Send;

    /// Replaces the state iff the stored version still equals
    /// `expected_version`. Check and write happen atomically.
    ///
    /// # Errors
    /// - `NotFound` if no game has this id
    /// - `VersionConflict` if another commit landed first; nothing is
    ///   written
    fn commit(
        &self,
        game_id: &GameId,
        state: GameState,
        expected_version: u64,
    ) -> impl Future<Output = Result<Versioned, StoreError>> + Send;
}
