//! Pure rule functions.
//!
//! Nothing in here mutates state. The state machine calls these to decide
//! what a transition does, then applies the result itself.

use serde::{Deserialize, Serialize};
use towers_protocol::PlayerId;

use crate::card::{Card, total_value};
use crate::player::PlayerState;

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// True iff a shield is chosen and at least one HP card is chosen.
///
/// Card structural validity is guaranteed by the `Card` type itself. The
/// count rule (`HpCardRule`) is configuration and checked separately.
pub fn validate_setup(shield: Option<&Card>, hp_cards: &[Card]) -> bool {
    shield.is_some() && !hp_cards.is_empty()
}

// ---------------------------------------------------------------------------
// Attack
// ---------------------------------------------------------------------------

/// The numeric outcome of one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResolution {
    /// Drawn card plus every stored card spent.
    pub attack_value: u32,
    /// Target's shield value, 0 without a shield.
    pub shield_value: u32,
    /// `attack_value - shield_value`, floored at 0.
    pub damage: u32,
    /// `attack_value > shield_value`. A tie fails.
    pub success: bool,
}

/// Resolves an attack. Same inputs always give the same resolution.
pub fn resolve_attack(
    drawn_card: &Card,
    stored_cards_used: &[Card],
    target_shield: Option<&Card>,
) -> AttackResolution {
    let attack_value = drawn_card.value() + total_value(stored_cards_used);
    let shield_value = target_shield.map_or(0, Card::value);
    AttackResolution {
        attack_value,
        shield_value,
        damage: attack_value.saturating_sub(shield_value),
        success: attack_value > shield_value,
    }
}

// ---------------------------------------------------------------------------
// Turn order
// ---------------------------------------------------------------------------

/// The next non-eliminated player after `current_id`, in join order,
/// wrapping around.
///
/// Returns `None` when nobody else is active, or when `current_id` is not
/// a participant at all (logged; callers should never get there).
pub fn next_active_player(current_id: &PlayerId, players: &[PlayerState]) -> Option<PlayerId> {
    let Some(pos) = players.iter().position(|p| &p.id == current_id) else {
        tracing::warn!(%current_id, "turn cursor points at an unknown player");
        return None;
    };
    (1..players.len())
        .map(|offset| &players[(pos + offset) % players.len()])
        .find(|p| !p.eliminated)
        .map(|p| p.id.clone())
}

/// The player who opens the battle: lowest HP among active players,
/// earliest joiner on ties.
pub fn first_turn_player(players: &[PlayerState]) -> Option<PlayerId> {
    players
        .iter()
        .filter(|p| !p.eliminated)
        // `min_by_key` keeps the first of equal minima, i.e. join order.
        .min_by_key(|p| p.hp)
        .map(|p| p.id.clone())
}

// ---------------------------------------------------------------------------
// Win detection
// ---------------------------------------------------------------------------

/// Whether the game is over, and who won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOver {
    pub over: bool,
    /// Set iff exactly one player remains.
    pub winner_id: Option<PlayerId>,
}

/// The game is over when at most one player is left standing.
pub fn check_game_over(players: &[PlayerState]) -> GameOver {
    let mut remaining = players.iter().filter(|p| !p.eliminated);
    let first = remaining.next();
    let more = remaining.next().is_some();
    match (first, more) {
        (_, true) => GameOver {
            over: false,
            winner_id: None,
        },
        (Some(winner), false) => GameOver {
            over: true,
            winner_id: Some(winner.id.clone()),
        },
        (None, false) => GameOver {
            over: true,
            winner_id: None,
        },
    }
}
