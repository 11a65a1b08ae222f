//! The request entry point: load, apply, commit, notify.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::sync::broadcast;
use towers_engine::{ActionRecord, Applied, GameState, GameView, apply_action};
use towers_protocol::{Action, GameId, PlayerId};
use towers_store::{GameStore, StoreError, Versioned};

use crate::{Notification, ServiceConfig, ServiceError};

/// A committed action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Version assigned by the store to the new state.
    pub version: u64,
    pub state: GameState,
    pub record: ActionRecord,
}

/// Server-authoritative front door for every game held in `S`.
///
/// Each request computes its new state from one consistent read and
/// commits it only if that read is still current. The service keeps no
/// per-game locks and no game state of its own, so any number of
/// requests for any number of games may run at once; the store's
/// conditional write decides who wins.
///
/// # Example
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use towers_protocol::{Action, GameId, PlayerId};
/// use towers_service::{GameService, ServiceConfig};
/// use towers_store::MemoryStore;
///
/// let service = GameService::new(MemoryStore::new(), ServiceConfig::default()).unwrap();
/// let game = GameId::from("table-1");
/// let players = [PlayerId::from("alice"), PlayerId::from("bob")];
///
/// service.start_game(game.clone(), &players).await.unwrap();
/// let setup = Action::Setup { shield_index: 0, hp_indices: vec![1, 2, 3] };
/// let outcome = service.apply_action(&game, &players[0], &setup).await.unwrap();
/// assert_eq!(outcome.version, 2);
/// # }
/// ```
pub struct GameService<S: GameStore> {
    store: S,
    config: ServiceConfig,
    events: broadcast::Sender<Notification>,
}

impl<S: GameStore> GameService<S> {
    /// Creates a service over `store`.
    ///
    /// # Errors
    /// `InvalidConfig` or an engine config error if `config` does not
    /// validate.
    pub fn new(store: S, config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            store,
            config,
            events,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Receives every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    // -- Game creation --

    /// Deals a new game with a freshly shuffled deck and stores it.
    ///
    /// `players` is the join order, which is also turn order.
    pub async fn start_game(
        &self,
        game_id: GameId,
        players: &[PlayerId],
    ) -> Result<Versioned, ServiceError> {
        let state = GameState::start(game_id, players, self.config.engine.clone(), &mut rand::rng())?;
        self.create(state).await
    }

    /// Like [`start_game`](Self::start_game) but shuffles with `rng`, for
    /// reproducible games.
    pub async fn start_game_with_rng<R: Rng + ?Sized>(
        &self,
        game_id: GameId,
        players: &[PlayerId],
        rng: &mut R,
    ) -> Result<Versioned, ServiceError> {
        let state = GameState::start(game_id, players, self.config.engine.clone(), rng)?;
        self.create(state).await
    }

    async fn create(&self, mut state: GameState) -> Result<Versioned, ServiceError> {
        let game_id = state.game_id.clone();
        state.updated_at_ms = now_ms();
        let created = self
            .store
            .create(&game_id, state)
            .await
            .map_err(|err| store_failure(&game_id, err))?;

        tracing::info!(
            %game_id,
            players = created.state.players.len(),
            "game created"
        );
        self.publish(&created, None);
        Ok(created)
    }

    // -- Actions --

    /// Reads the current state of a game. Its `version` is what a later
    /// [`submit`](Self::submit) is conditioned on.
    pub async fn load(&self, game_id: &GameId) -> Result<Versioned, ServiceError> {
        self.store
            .load(game_id)
            .await
            .map_err(|err| store_failure(game_id, err))
    }

    /// Applies `action` iff the game is still at `expected_version`.
    ///
    /// The caller only names the version its decision was based on; the
    /// state the engine runs on is always read from the store here, so a
    /// client cannot hand the service a state of its own.
    ///
    /// # Errors
    /// - `ConcurrentModification` if the game has moved past
    ///   `expected_version`, either before the read or before the commit
    /// - `Engine(..)` if the action breaks a rule; nothing is written
    /// - `StorageUnavailable` if the store fails
    pub async fn submit(
        &self,
        game_id: &GameId,
        expected_version: u64,
        actor: &PlayerId,
        action: &Action,
    ) -> Result<ActionOutcome, ServiceError> {
        let current = self.load(game_id).await?;
        if current.version != expected_version {
            tracing::warn!(
                %game_id,
                expected = expected_version,
                actual = current.version,
                "submit against a stale version"
            );
            return Err(ServiceError::ConcurrentModification {
                expected: expected_version,
                actual: current.version,
            });
        }
        self.commit_action(current, actor, action).await
    }

    /// Loads the game and applies `action` to what was loaded.
    ///
    /// There is no automatic retry. On `ConcurrentModification` the
    /// caller should look at the fresh state and decide again.
    pub async fn apply_action(
        &self,
        game_id: &GameId,
        actor: &PlayerId,
        action: &Action,
    ) -> Result<ActionOutcome, ServiceError> {
        let current = self.load(game_id).await?;
        self.commit_action(current, actor, action).await
    }

    /// Runs the engine on a snapshot read from the store and commits the
    /// result conditioned on that snapshot's version.
    async fn commit_action(
        &self,
        snapshot: Versioned,
        actor: &PlayerId,
        action: &Action,
    ) -> Result<ActionOutcome, ServiceError> {
        let game_id = &snapshot.state.game_id;
        let Applied { mut state, record } = apply_action(&snapshot.state, actor, action)?;
        state.updated_at_ms = now_ms();

        let committed = self
            .store
            .commit(game_id, state, snapshot.version)
            .await
            .map_err(|err| store_failure(game_id, err))?;

        tracing::debug!(
            %game_id,
            %actor,
            kind = %record.kind,
            version = committed.version,
            "action committed"
        );
        self.publish(&committed, Some(record.clone()));

        Ok(ActionOutcome {
            version: committed.version,
            state: committed.state,
            record,
        })
    }

    /// What `viewer` may see of a game.
    pub async fn view(&self, game_id: &GameId, viewer: &PlayerId) -> Result<GameView, ServiceError> {
        let snapshot = self.load(game_id).await?;
        Ok(snapshot.state.view_for(viewer))
    }

    // -- Notifications --

    fn publish(&self, committed: &Versioned, record: Option<ActionRecord>) {
        // `send` only fails when nobody is subscribed.
        let _ = self.events.send(Notification::StateChanged {
            game_id: committed.state.game_id.clone(),
            version: committed.version,
            state: Arc::new(committed.state.clone()),
        });
        if let Some(record) = record {
            let _ = self.events.send(Notification::ActionApplied(record));
        }
    }
}

/// Logs a store failure at the level it deserves and converts it.
fn store_failure(game_id: &GameId, err: StoreError) -> ServiceError {
    match &err {
        StoreError::VersionConflict { expected, actual } => {
            tracing::warn!(%game_id, expected, actual, "commit lost to a concurrent write");
        }
        StoreError::Unavailable(_) | StoreError::Codec(_) => {
            tracing::error!(%game_id, error = %err, "storage failure");
        }
        StoreError::NotFound(_) | StoreError::AlreadyExists(_) => {}
    }
    err.into()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
