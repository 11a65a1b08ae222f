//! The authoritative per-game state value.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use towers_protocol::{GameId, PlayerId};

use crate::card::Card;
use crate::config::{EngineConfig, GameStatus};
use crate::deck::{DECK_SIZE, Deck};
use crate::player::PlayerState;
use crate::EngineError;

/// One game's complete state.
///
/// This is an owned value: the service loads it, the state machine
/// produces a new one from it, and the store persists that. Nobody holds
/// a mutable reference across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: GameId,
    pub status: GameStatus,

    /// Whose turn it is. `None` until the battle begins.
    pub current_player_id: Option<PlayerId>,

    pub deck: Deck,
    pub discard_pile: Vec<Card>,

    /// Participants in join order, which is also turn order.
    pub players: Vec<PlayerState>,

    /// Set only when `status == Finished` and one player survived.
    pub winner_id: Option<PlayerId>,

    /// Store-assigned version of this snapshot; bumped on every commit.
    pub version: u64,

    /// Wall-clock time of the last commit, in milliseconds since the
    /// Unix epoch. Informational; concurrency uses `version`.
    pub updated_at_ms: u64,

    /// The rules this game was started with.
    pub config: EngineConfig,
}

impl GameState {
    /// An empty game that has not been dealt yet.
    pub fn new(game_id: GameId, config: EngineConfig) -> Self {
        Self {
            game_id,
            status: GameStatus::Waiting,
            current_player_id: None,
            deck: Deck::default(),
            discard_pile: Vec::new(),
            players: Vec::new(),
            winner_id: None,
            version: 0,
            updated_at_ms: 0,
            config,
        }
    }

    /// Builds and shuffles the deck, deals every player a hand, and opens
    /// the setup phase.
    ///
    /// `players` is the join order and becomes the turn order. Dealing is
    /// round-robin, one card at a time.
    pub fn start<R: Rng + ?Sized>(
        game_id: GameId,
        players: &[PlayerId],
        config: EngineConfig,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        if players.len() < config.min_players || players.len() > config.max_players {
            return Err(EngineError::InvalidPlayerCount {
                count: players.len(),
                min: config.min_players,
                max: config.max_players,
            });
        }
        let mut seen = HashSet::with_capacity(players.len());
        for id in players {
            if !seen.insert(id) {
                return Err(EngineError::DuplicatePlayer(id.clone()));
            }
        }

        let mut state = Self::new(game_id, config);
        state.deck = Deck::shuffled(rng);
        state.players = players.iter().cloned().map(PlayerState::new).collect();

        for _ in 0..state.config.hand_size {
            for player in &mut state.players {
                let card = state.deck.draw().ok_or(EngineError::DeckExhausted)?;
                player.hand.push(card);
            }
        }

        debug_assert!(state.status.can_transition_to(GameStatus::Setup));
        state.status = GameStatus::Setup;
        tracing::info!(
            game_id = %state.game_id,
            players = state.players.len(),
            hand_size = state.config.hand_size,
            "game dealt, setup open"
        );
        Ok(state)
    }

    // -- Lookups --

    /// Position of `id` in turn order.
    pub fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Players still in the fight, in turn order.
    pub fn active_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter().filter(|p| !p.eliminated)
    }

    /// Returns `true` if every player has committed their setup.
    pub fn all_setup_complete(&self) -> bool {
        self.players.iter().all(|p| p.setup_complete)
    }

    /// Cards accounted for across deck, discard pile, and every player.
    pub fn card_count(&self) -> usize {
        self.deck.len()
            + self.discard_pile.len()
            + self.players.iter().map(PlayerState::card_count).sum::<usize>()
    }

    // -- Invariants --

    /// Verifies the structural invariants every reachable state satisfies.
    ///
    /// - the 52 cards are all present exactly once across deck, discard
    ///   pile, and players (skipped while `Waiting`, before the deal)
    /// - `eliminated == (hp == 0)` for every player past setup
    /// - during the battle the turn belongs to an active player
    /// - a finished game's winner is the only survivor
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.status != GameStatus::Waiting {
            let all_cards: Vec<&Card> = self
                .deck
                .iter()
                .chain(self.discard_pile.iter())
                .chain(self.players.iter().flat_map(PlayerState::cards))
                .collect();
            if all_cards.len() != DECK_SIZE {
                return Err(InvariantViolation(format!(
                    "{} cards in play, expected {DECK_SIZE}",
                    all_cards.len()
                )));
            }
            let unique: HashSet<&Card> = all_cards.iter().copied().collect();
            if unique.len() != DECK_SIZE {
                return Err(InvariantViolation(format!(
                    "{} duplicate cards in play",
                    DECK_SIZE - unique.len()
                )));
            }
        }

        for p in self.players.iter().filter(|p| p.setup_complete) {
            if p.eliminated != (p.hp == 0) {
                return Err(InvariantViolation(format!(
                    "{} has hp {} but eliminated = {}",
                    p.id, p.hp, p.eliminated
                )));
            }
            if !p.hand.is_empty() {
                return Err(InvariantViolation(format!(
                    "{} finished setup but still holds {} hand cards",
                    p.id,
                    p.hand.len()
                )));
            }
        }

        match self.status {
            GameStatus::Waiting | GameStatus::Setup => {
                if self.current_player_id.is_some() {
                    return Err(InvariantViolation(
                        "turn cursor set before the battle".into(),
                    ));
                }
            }
            GameStatus::InProgress => {
                let current = self
                    .current_player_id
                    .as_ref()
                    .and_then(|id| self.player(id))
                    .ok_or_else(|| InvariantViolation("battle without a current player".into()))?;
                if current.eliminated {
                    return Err(InvariantViolation(format!(
                        "turn belongs to eliminated player {}",
                        current.id
                    )));
                }
            }
            GameStatus::Finished => {
                let survivors: Vec<&PlayerId> = self.active_players().map(|p| &p.id).collect();
                if survivors.len() > 1 {
                    return Err(InvariantViolation(format!(
                        "finished with {} players standing",
                        survivors.len()
                    )));
                }
                if self.winner_id.as_ref() != survivors.first().copied() {
                    return Err(InvariantViolation("winner is not the last survivor".into()));
                }
            }
        }
        if self.status != GameStatus::Finished && self.winner_id.is_some() {
            return Err(InvariantViolation("winner set before the game finished".into()));
        }

        Ok(())
    }

    // -- Views --

    /// What `viewer` is allowed to see.
    ///
    /// Other players' hands and stored cards are reduced to counts, and
    /// their shields stay hidden until the battle begins. The deck is
    /// reduced to its size.
    pub fn view_for(&self, viewer: &PlayerId) -> GameView {
        let reveal_shields = self.status != GameStatus::Setup;
        GameView {
            game_id: self.game_id.clone(),
            status: self.status,
            current_player_id: self.current_player_id.clone(),
            deck_remaining: self.deck.len(),
            discard_pile: self.discard_pile.clone(),
            winner_id: self.winner_id.clone(),
            version: self.version,
            me: self.player(viewer).cloned(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id.clone(),
                    shield: if reveal_shields || &p.id == viewer {
                        p.shield
                    } else {
                        None
                    },
                    hp: p.hp,
                    hp_cards: if reveal_shields { p.hp_cards.clone() } else { Vec::new() },
                    hand_count: p.hand.len(),
                    stored_count: p.stored_cards.len(),
                    setup_complete: p.setup_complete,
                    eliminated: p.eliminated,
                })
                .collect(),
        }
    }
}

/// A broken structural invariant. Seeing one means an engine bug or a
/// corrupted blob, never a player mistake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invariant violated: {0}")]
pub struct InvariantViolation(pub String);

/// A per-viewer projection of [`GameState`] for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: GameId,
    pub status: GameStatus,
    pub current_player_id: Option<PlayerId>,
    pub deck_remaining: usize,
    pub discard_pile: Vec<Card>,
    pub winner_id: Option<PlayerId>,
    pub version: u64,
    /// The viewer's own full state, if they are playing.
    pub me: Option<PlayerState>,
    pub players: Vec<PlayerView>,
}

/// Public information about one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub shield: Option<Card>,
    pub hp: u32,
    pub hp_cards: Vec<Card>,
    pub hand_count: usize,
    pub stored_count: usize,
    pub setup_complete: bool,
    pub eliminated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ids(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|n| PlayerId::from(*n)).collect()
    }

    fn started(names: &[&str]) -> GameState {
        GameState::start(
            GameId::from("g1"),
            &ids(names),
            EngineConfig::default(),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap()
    }

    #[test]
    fn test_new_game_is_waiting_and_empty() {
        let state = GameState::new(GameId::from("g1"), EngineConfig::default());
        assert_eq!(state.status, GameStatus::Waiting);
        assert_eq!(state.card_count(), 0);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_start_deals_hands_in_join_order() {
        let state = started(&["a", "b", "c"]);

        assert_eq!(state.status, GameStatus::Setup);
        assert_eq!(state.current_player_id, None);
        let order: Vec<&str> = state.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
        for p in &state.players {
            assert_eq!(p.hand.len(), 4);
        }
        assert_eq!(state.deck.len(), 52 - 12);
        assert_eq!(state.card_count(), 52);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_start_is_reproducible_with_a_seed() {
        assert_eq!(started(&["a", "b"]), started(&["a", "b"]));
    }

    #[test]
    fn test_start_rejects_too_few_players() {
        let result = GameState::start(
            GameId::from("g1"),
            &ids(&["solo"]),
            EngineConfig::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(
            result.unwrap_err(),
            EngineError::InvalidPlayerCount {
                count: 1,
                min: 2,
                max: 6
            }
        );
    }

    #[test]
    fn test_start_rejects_too_many_players() {
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        let result = GameState::start(
            GameId::from("g1"),
            &ids(&names),
            EngineConfig::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(EngineError::InvalidPlayerCount { count: 7, .. })));
    }

    #[test]
    fn test_start_rejects_duplicate_players() {
        let result = GameState::start(
            GameId::from("g1"),
            &ids(&["a", "b", "a"]),
            EngineConfig::default(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(result.unwrap_err(), EngineError::DuplicatePlayer(PlayerId::from("a")));
    }

    #[test]
    fn test_invariants_catch_a_lost_card() {
        let mut state = started(&["a", "b"]);
        state.deck.draw();
        let err = state.check_invariants().unwrap_err();
        assert!(err.0.contains("51 cards"));
    }

    #[test]
    fn test_invariants_catch_a_duplicated_card() {
        let mut state = started(&["a", "b"]);
        let card = state.deck.draw().unwrap();
        state.discard_pile.push(card);
        state.discard_pile.push(card);
        state.deck.draw();
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_catch_inconsistent_elimination() {
        let mut state = started(&["a", "b"]);
        let p = &mut state.players[0];
        p.setup_complete = true;
        state.discard_pile.append(&mut p.hand);
        p.hp = 0;
        p.eliminated = false;
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_view_hides_other_hands_during_setup() {
        let state = started(&["a", "b"]);
        let view = state.view_for(&PlayerId::from("a"));

        assert_eq!(view.me.as_ref().map(|p| p.hand.len()), Some(4));
        assert_eq!(view.deck_remaining, 44);
        let other = &view.players[1];
        assert_eq!(other.hand_count, 4);
        assert_eq!(other.shield, None);
    }

    #[test]
    fn test_view_for_spectator_has_no_me() {
        let state = started(&["a", "b"]);
        let view = state.view_for(&PlayerId::from("watcher"));
        assert!(view.me.is_none());
        assert_eq!(view.players.len(), 2);
    }
}
