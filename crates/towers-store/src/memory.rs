//! In-process [`GameStore`] backed by a map of encoded blobs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use towers_engine::GameState;
use towers_protocol::{Codec, GameId, JsonCodec};

use crate::{GameStore, StoreError, Versioned};

/// One stored game: the committed version and the state as bytes.
#[derive(Debug)]
struct Entry {
    version: u64,
    blob: Vec<u8>,
}

/// A [`GameStore`] that keeps every game in memory.
///
/// States are kept encoded with `C` rather than as live values, so every
/// load hands out a fresh copy and a state that cannot survive the codec
/// fails here the same way it would against a real database.
///
/// The version check and the write in [`commit`](GameStore::commit)
/// happen under one write lock, which gives compare-and-swap semantics.
pub struct MemoryStore<C: Codec = JsonCodec> {
    codec: C,
    games: RwLock<HashMap<GameId, Entry>>,
    available: AtomicBool,
}

impl MemoryStore<JsonCodec> {
    /// An empty store using JSON blobs.
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl Default for MemoryStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> MemoryStore<C> {
    /// An empty store using the given codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            games: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates an outage. While unavailable, every call fails with
    /// [`StoreError::Unavailable`] and nothing is read or written.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::debug!(available, "memory store availability changed");
    }

    /// Number of stored games.
    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    /// Returns `true` if no games are stored.
    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".into()))
        }
    }

    fn encode(&self, mut state: GameState, version: u64) -> Result<(Entry, GameState), StoreError> {
        state.version = version;
        let blob = self.codec.encode(&state)?;
        Ok((Entry { version, blob }, state))
    }
}

impl<C: Codec> GameStore for MemoryStore<C> {
    async fn create(&self, game_id: &GameId, state: GameState) -> Result<Versioned, StoreError> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        if games.contains_key(game_id) {
            return Err(StoreError::AlreadyExists(game_id.clone()));
        }
        let (entry, state) = self.encode(state, 1)?;
        games.insert(game_id.clone(), entry);
        tracing::debug!(%game_id, version = 1, "game created");
        Ok(Versioned { version: 1, state })
    }

    async fn load(&self, game_id: &GameId) -> Result<Versioned, StoreError> {
        self.ensure_available()?;
        let games = self.games.read().await;
        let entry = games
            .get(game_id)
            .ok_or_else(|| StoreError::NotFound(game_id.clone()))?;
        let state: GameState = self.codec.decode(&entry.blob)?;
        Ok(Versioned {
            version: entry.version,
            state,
        })
    }

    async fn commit(
        &self,
        game_id: &GameId,
        state: GameState,
        expected_version: u64,
    ) -> Result<Versioned, StoreError> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        let entry = games
            .get_mut(game_id)
            .ok_or_else(|| StoreError::NotFound(game_id.clone()))?;
        if entry.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: entry.version,
            });
        }
        let version = expected_version + 1;
        let (next, state) = self.encode(state, version)?;
        *entry = next;
        tracing::trace!(%game_id, version, "game committed");
        Ok(Versioned { version, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use towers_engine::EngineConfig;

    fn fresh(id: &str) -> GameState {
        GameState::new(GameId::from(id), EngineConfig::default())
    }

    #[tokio::test]
    async fn test_create_assigns_version_one() {
        let store = MemoryStore::new();
        let id = GameId::from("g1");

        let created = store.create(&id, fresh("g1")).await.unwrap();

        assert_eq!(created.version, 1);
        assert_eq!(created.state.version, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_twice_is_already_exists() {
        let store = MemoryStore::new();
        let id = GameId::from("g1");
        store.create(&id, fresh("g1")).await.unwrap();

        let err = store.create(&id, fresh("g1")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(g) if g == id));
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load(&GameId::from("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_commit_with_stale_version_writes_nothing() {
        let store = MemoryStore::new();
        let id = GameId::from("g1");
        store.create(&id, fresh("g1")).await.unwrap();

        let mut changed = fresh("g1");
        changed.updated_at_ms = 42;
        store.commit(&id, changed.clone(), 1).await.unwrap();

        changed.updated_at_ms = 99;
        let err = store.commit(&id, changed, 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                actual: 2
            }
        ));
        assert_eq!(store.load(&id).await.unwrap().state.updated_at_ms, 42);
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_everything() {
        let store = MemoryStore::new();
        let id = GameId::from("g1");
        store.create(&id, fresh("g1")).await.unwrap();
        store.set_available(false);

        assert!(matches!(
            store.load(&id).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.commit(&id, fresh("g1"), 1).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_available(true);
        assert_eq!(store.load(&id).await.unwrap().version, 1);
    }
}
