//! Notifications published after every successful commit.

use std::sync::Arc;

use towers_engine::{ActionRecord, GameState};
use towers_protocol::GameId;

/// What subscribers of [`GameService::subscribe`](crate::GameService::subscribe)
/// receive.
///
/// For an applied action the service sends `StateChanged` first and
/// `ActionApplied` right after it. Starting a game sends `StateChanged`
/// alone. Delivering these to remote clients is up to whoever holds the
/// receiver.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A new state was committed.
    StateChanged {
        game_id: GameId,
        version: u64,
        state: Arc<GameState>,
    },

    /// Audit entry for the action that produced the preceding state.
    ActionApplied(ActionRecord),
}

impl Notification {
    /// The game this notification is about.
    pub fn game_id(&self) -> &GameId {
        match self {
            Self::StateChanged { game_id, .. } => game_id,
            Self::ActionApplied(record) => &record.game_id,
        }
    }
}
