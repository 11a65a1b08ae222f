//! Error types for the engine layer.

use towers_protocol::PlayerId;

/// A rule violation detected before any state change.
///
/// Every engine operation is all-or-nothing: when one of these is
/// returned, the input state is untouched and no card has moved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A turn-gated action from someone other than the current player.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The target is missing, the actor themselves where that is not
    /// allowed, already eliminated, or has not finished setup.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Out-of-range, duplicate, or otherwise malformed card indices.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// A draw was needed but the deck is empty.
    #[error("the deck is exhausted")]
    DeckExhausted,

    /// The game has ended; it accepts no more actions.
    #[error("the game is finished")]
    GameFinished,

    /// A battle action before every player has completed setup, or any
    /// action before cards are dealt.
    #[error("the battle has not started")]
    GameNotStarted,

    /// A setup action from a player who has already set up (or after the
    /// battle has begun).
    #[error("{0} has already completed setup")]
    AlreadySetup(PlayerId),

    /// The actor is not a participant of this game.
    #[error("{0} is not playing in this game")]
    NotInGame(PlayerId),

    /// The actor has been eliminated and may not act.
    #[error("{0} has been eliminated")]
    ActorEliminated(PlayerId),

    /// Start requested with too few or too many players.
    #[error("cannot start with {count} players (need {min}-{max})")]
    InvalidPlayerCount { count: usize, min: usize, max: usize },

    /// The same id appears twice in the starting player list.
    #[error("player {0} listed more than once")]
    DuplicatePlayer(PlayerId),

    /// The engine configuration does not describe a playable game.
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_player() {
        let err = EngineError::NotYourTurn(PlayerId::from("alice"));
        assert_eq!(err.to_string(), "it is not alice's turn");

        let err = EngineError::AlreadySetup(PlayerId::from("bob"));
        assert!(err.to_string().contains("bob"));
    }

    #[test]
    fn test_player_count_message() {
        let err = EngineError::InvalidPlayerCount {
            count: 1,
            min: 2,
            max: 6,
        };
        assert_eq!(err.to_string(), "cannot start with 1 players (need 2-6)");
    }
}
