//! Engine configuration and the game lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::deck::DECK_SIZE;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// How many HP cards a player must pick during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HpCardRule {
    /// Any non-empty selection.
    #[default]
    AtLeastOne,

    /// Exactly this many cards (the "pick three" table variant).
    Exactly(usize),
}

impl HpCardRule {
    /// Returns `true` if `count` HP cards satisfies this rule.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::AtLeastOne => count >= 1,
            Self::Exactly(n) => count == n,
        }
    }
}

/// Rules that are fixed for the lifetime of one game.
///
/// A copy is stored inside every `GameState`, so a game keeps the rules
/// it was started with even if the server's defaults change later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum players required to start.
    pub min_players: usize,

    /// Maximum players allowed at one table.
    pub max_players: usize,

    /// Cards dealt to each player before setup.
    pub hand_size: usize,

    /// Constraint on the number of HP cards picked at setup.
    pub hp_cards: HpCardRule,

    /// Whether `change_other_shield` may target the actor themselves.
    pub allow_self_shield_change: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 6,
            hand_size: 4,
            hp_cards: HpCardRule::AtLeastOne,
            allow_self_shield_change: false,
        }
    }
}

impl EngineConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the settings describe a playable game.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_players < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "min_players must be at least 2, got {}",
                self.min_players
            )));
        }
        if self.min_players > self.max_players {
            return Err(EngineError::InvalidConfig(format!(
                "min_players ({}) exceeds max_players ({})",
                self.min_players, self.max_players
            )));
        }
        // One shield plus at least one HP card.
        if self.hand_size < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "hand_size must be at least 2, got {}",
                self.hand_size
            )));
        }
        if self.max_players * self.hand_size > DECK_SIZE {
            return Err(EngineError::InvalidConfig(format!(
                "{} players x {} cards exceeds the {DECK_SIZE}-card deck",
                self.max_players, self.hand_size
            )));
        }
        if let HpCardRule::Exactly(n) = self.hp_cards {
            if n == 0 || n + 1 > self.hand_size {
                return Err(EngineError::InvalidConfig(format!(
                    "exactly {n} HP cards cannot be picked from a hand of {} with a shield",
                    self.hand_size
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a game.
///
/// Transitions are strictly ordered, with no skipping:
///
/// ```text
/// Waiting → Setup → InProgress → Finished
/// ```
///
/// - **Waiting**: the game exists but nothing has been dealt.
/// - **Setup**: hands are dealt; players pick shield and HP cards
///   concurrently. No turn cursor.
/// - **InProgress**: the battle phase. Exactly one player holds the turn.
/// - **Finished**: at most one player remains. Terminal; the state never
///   changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Setup,
    InProgress,
    Finished,
}

impl GameStatus {
    /// Returns `true` if the game accepts no further actions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns the next state, or `None` from the terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Setup),
            Self::Setup => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Setup => write!(f, "setup"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_status_next_follows_strict_order() {
        assert_eq!(GameStatus::Waiting.next(), Some(GameStatus::Setup));
        assert_eq!(GameStatus::Setup.next(), Some(GameStatus::InProgress));
        assert_eq!(GameStatus::InProgress.next(), Some(GameStatus::Finished));
        assert_eq!(GameStatus::Finished.next(), None);
    }

    #[test]
    fn test_game_status_can_transition_to() {
        assert!(GameStatus::Setup.can_transition_to(GameStatus::InProgress));
        assert!(!GameStatus::Setup.can_transition_to(GameStatus::Finished));
        assert!(!GameStatus::Finished.can_transition_to(GameStatus::Waiting));
    }

    #[test]
    fn test_lifecycle_walks_every_status_once() {
        let mut seen = vec![GameStatus::Waiting];
        let mut status = GameStatus::Waiting;
        while let Some(next) = status.next() {
            assert!(status.can_transition_to(next));
            seen.push(next);
            status = next;
        }
        assert!(status.is_terminal());
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_only_finished_is_terminal() {
        assert!(!GameStatus::Waiting.is_terminal());
        assert!(!GameStatus::Setup.is_terminal());
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(GameStatus::Finished.is_terminal());
    }

    #[test]
    fn test_game_status_display_matches_wire_name() {
        let wire = serde_json::to_string(&GameStatus::InProgress).unwrap();
        assert_eq!(wire, format!("\"{}\"", GameStatus::InProgress));
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 6);
        assert_eq!(config.hand_size, 4);
        assert_eq!(config.hp_cards, HpCardRule::AtLeastOne);
        assert!(!config.allow_self_shield_change);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hp_card_rule_accepts() {
        assert!(!HpCardRule::AtLeastOne.accepts(0));
        assert!(HpCardRule::AtLeastOne.accepts(1));
        assert!(HpCardRule::AtLeastOne.accepts(5));
        assert!(HpCardRule::Exactly(3).accepts(3));
        assert!(!HpCardRule::Exactly(3).accepts(2));
    }

    #[test]
    fn test_validate_rejects_oversized_table() {
        let config = EngineConfig {
            max_players: 14,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_unsatisfiable_exact_rule() {
        let config = EngineConfig {
            hp_cards: HpCardRule::Exactly(4),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            hp_cards: HpCardRule::Exactly(3),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_min_above_max() {
        let config = EngineConfig {
            min_players: 5,
            max_players: 3,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "hp_cards": { "exactly": 3 } }"#).unwrap();
        assert_eq!(config.hp_cards, HpCardRule::Exactly(3));
        assert_eq!(config.hand_size, 4);
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        let result = EngineConfig::from_json("{ nope");
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }
}
