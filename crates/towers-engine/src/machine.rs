//! The game state machine: applies one requested action to a state.
//!
//! [`apply_action`] is the only way a started game changes. It is a pure
//! function of `(state, actor, action)`: every precondition is checked
//! before anything moves, and the input state is never touched, so a
//! rejected action leaves no trace.

use serde::{Deserialize, Serialize};
use towers_protocol::{Action, ActionKind, GameId, PlayerId};

use crate::card::{Card, total_value};
use crate::config::GameStatus;
use crate::rules::{self, AttackResolution};
use crate::state::GameState;
use crate::EngineError;

/// A successfully applied action: the new state and what happened.
#[derive(Debug, Clone)]
pub struct Applied {
    pub state: GameState,
    pub record: ActionRecord,
}

/// A structured audit entry for one applied action.
///
/// Meant for an external activity feed to persist and render; the engine
/// produces no display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub game_id: GameId,
    pub actor: PlayerId,
    pub kind: ActionKind,
    pub summary: ActionSummary,
}

/// The result of an action, per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSummary {
    SetupCompleted {
        hp: u32,
        hp_card_count: usize,
        /// Hand cards left unpicked and sent to the discard pile.
        discarded: usize,
        /// Set when this was the last setup and the battle began.
        first_player: Option<PlayerId>,
    },
    ShieldChanged {
        target: PlayerId,
        new_shield: Card,
        old_shield: Option<Card>,
    },
    CardStored {
        stored_count: usize,
    },
    AttackResolved {
        target: PlayerId,
        drawn_card: Card,
        stored_used: Vec<Card>,
        resolution: AttackResolution,
        target_hp: u32,
        /// Stored cards the target lost because the hit did damage.
        target_stored_lost: usize,
        eliminated: bool,
        winner: Option<PlayerId>,
    },
}

/// Applies `action` on behalf of `actor` and returns the resulting state.
///
/// # Errors
/// Any [`EngineError`] rule kind. On error the input is unchanged and no
/// new state exists.
pub fn apply_action(
    state: &GameState,
    actor: &PlayerId,
    action: &Action,
) -> Result<Applied, EngineError> {
    let mut next = state.clone();

    let result = match action {
        Action::Setup {
            shield_index,
            hp_indices,
        } => apply_setup(&mut next, actor, *shield_index, hp_indices),
        Action::ChangeOwnShield => {
            let actor_idx = ensure_turn(&next, actor)?;
            replace_shield(&mut next, actor_idx, actor_idx)
        }
        Action::ChangeOtherShield { target } => {
            let actor_idx = ensure_turn(&next, actor)?;
            let target_idx = shield_target(&next, actor_idx, target)?;
            replace_shield(&mut next, actor_idx, target_idx)
        }
        Action::StoreCard => {
            let actor_idx = ensure_turn(&next, actor)?;
            store_card(&mut next, actor_idx)
        }
        Action::Attack {
            target,
            stored_indices,
        } => validate_attack_request(&next, actor, target, stored_indices)
            .and_then(|(actor_idx, target_idx)| {
                attack(&mut next, actor_idx, target_idx, stored_indices)
            }),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            tracing::debug!(
                game_id = %state.game_id,
                %actor,
                kind = %action.kind(),
                target = ?action.target(),
                error = %err,
                "action rejected"
            );
            return Err(err);
        }
    };

    debug_assert!(
        next.check_invariants().is_ok(),
        "{:?}",
        next.check_invariants()
    );

    tracing::debug!(
        game_id = %next.game_id,
        %actor,
        kind = %action.kind(),
        target = ?action.target(),
        status = %next.status,
        "action applied"
    );

    let record = ActionRecord {
        game_id: next.game_id.clone(),
        actor: actor.clone(),
        kind: action.kind(),
        summary,
    };
    Ok(Applied {
        state: next,
        record,
    })
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Gate for battle actions. Returns the actor's index.
fn ensure_turn(state: &GameState, actor: &PlayerId) -> Result<usize, EngineError> {
    match state.status {
        GameStatus::Finished => return Err(EngineError::GameFinished),
        GameStatus::Waiting | GameStatus::Setup => return Err(EngineError::GameNotStarted),
        GameStatus::InProgress => {}
    }
    let idx = state
        .player_index(actor)
        .ok_or_else(|| EngineError::NotInGame(actor.clone()))?;
    if state.current_player_id.as_ref() != Some(actor) {
        return Err(EngineError::NotYourTurn(actor.clone()));
    }
    if state.players[idx].eliminated {
        return Err(EngineError::ActorEliminated(actor.clone()));
    }
    Ok(idx)
}

/// Index of `target` if it may be hit by a battle action: present, set
/// up, and still standing.
fn live_target(state: &GameState, target: &PlayerId) -> Result<usize, EngineError> {
    let idx = state
        .player_index(target)
        .ok_or_else(|| EngineError::InvalidTarget(format!("{target} is not in this game")))?;
    let player = &state.players[idx];
    if !player.setup_complete {
        return Err(EngineError::InvalidTarget(format!("{target} has not completed setup")));
    }
    if player.eliminated {
        return Err(EngineError::InvalidTarget(format!("{target} is already eliminated")));
    }
    Ok(idx)
}

fn shield_target(
    state: &GameState,
    actor_idx: usize,
    target: &PlayerId,
) -> Result<usize, EngineError> {
    let idx = live_target(state, target)?;
    if idx == actor_idx && !state.config.allow_self_shield_change {
        return Err(EngineError::InvalidTarget(
            "use change_own_shield to replace your own shield".into(),
        ));
    }
    Ok(idx)
}

/// Checks that `indices` are in range for a collection of `len` and
/// contain no repeats.
fn check_indices(indices: &[usize], len: usize, what: &str) -> Result<(), EngineError> {
    for (pos, &i) in indices.iter().enumerate() {
        if i >= len {
            return Err(EngineError::InvalidSelection(format!(
                "{what} index {i} out of range ({len} available)"
            )));
        }
        if indices[..pos].contains(&i) {
            return Err(EngineError::InvalidSelection(format!(
                "{what} index {i} selected twice"
            )));
        }
    }
    Ok(())
}

/// Checks everything an attack needs before any card moves: the actor
/// holds the turn, the target is another live player, the stored-card
/// indices are in range and distinct, and the deck can supply the attack
/// card.
///
/// Returns `(actor_index, target_index)` into `state.players`.
pub fn validate_attack_request(
    state: &GameState,
    actor: &PlayerId,
    target: &PlayerId,
    stored_indices: &[usize],
) -> Result<(usize, usize), EngineError> {
    let actor_idx = ensure_turn(state, actor)?;
    let target_idx = live_target(state, target)?;
    if target_idx == actor_idx {
        return Err(EngineError::InvalidTarget("you cannot attack yourself".into()));
    }
    check_indices(
        stored_indices,
        state.players[actor_idx].stored_cards.len(),
        "stored card",
    )?;
    if state.deck.is_empty() {
        return Err(EngineError::DeckExhausted);
    }
    Ok((actor_idx, target_idx))
}

fn draw(state: &mut GameState) -> Result<Card, EngineError> {
    state.deck.draw().ok_or(EngineError::DeckExhausted)
}

/// Passes the turn to the next active player after `actor_idx`.
fn advance_turn(state: &mut GameState, actor_idx: usize) {
    let actor = &state.players[actor_idx].id;
    match rules::next_active_player(actor, &state.players) {
        Some(next) => state.current_player_id = Some(next),
        None => tracing::warn!(
            game_id = %state.game_id,
            %actor,
            "no other active player to pass the turn to"
        ),
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

fn apply_setup(
    state: &mut GameState,
    actor: &PlayerId,
    shield_index: usize,
    hp_indices: &[usize],
) -> Result<ActionSummary, EngineError> {
    match state.status {
        GameStatus::Finished => return Err(EngineError::GameFinished),
        GameStatus::Waiting => return Err(EngineError::GameNotStarted),
        GameStatus::InProgress => return Err(EngineError::AlreadySetup(actor.clone())),
        GameStatus::Setup => {}
    }
    let idx = state
        .player_index(actor)
        .ok_or_else(|| EngineError::NotInGame(actor.clone()))?;
    let player = &state.players[idx];
    if player.setup_complete {
        return Err(EngineError::AlreadySetup(actor.clone()));
    }

    let hand_len = player.hand.len();
    if shield_index >= hand_len {
        return Err(EngineError::InvalidSelection(format!(
            "shield index {shield_index} out of range ({hand_len} in hand)"
        )));
    }
    check_indices(hp_indices, hand_len, "hp card")?;
    if hp_indices.contains(&shield_index) {
        return Err(EngineError::InvalidSelection(format!(
            "card {shield_index} cannot be both shield and hp card"
        )));
    }
    if !state.config.hp_cards.accepts(hp_indices.len()) {
        return Err(EngineError::InvalidSelection(format!(
            "{} hp cards not allowed by rule {:?}",
            hp_indices.len(),
            state.config.hp_cards
        )));
    }

    let shield = player.hand[shield_index];
    let hp_cards: Vec<Card> = hp_indices.iter().map(|&i| player.hand[i]).collect();
    if !rules::validate_setup(Some(&shield), &hp_cards) {
        return Err(EngineError::InvalidSelection("a shield and at least one hp card are required".into()));
    }

    // -- Validated; mutate. --

    let player = &mut state.players[idx];
    let leftovers: Vec<Card> = player
        .hand
        .drain(..)
        .enumerate()
        .filter(|(i, _)| *i != shield_index && !hp_indices.contains(i))
        .map(|(_, card)| card)
        .collect();
    player.hp = total_value(&hp_cards);
    player.shield = Some(shield);
    player.hp_cards = hp_cards;
    player.setup_complete = true;
    player.eliminated = player.hp == 0;
    let hp = player.hp;
    let hp_card_count = player.hp_cards.len();
    let discarded = leftovers.len();
    state.discard_pile.extend(leftovers);

    tracing::debug!(game_id = %state.game_id, %actor, hp, "setup completed");

    let mut first_player = None;
    if state.all_setup_complete() {
        first_player = rules::first_turn_player(&state.players);
        state.current_player_id = first_player.clone();
        debug_assert!(state.status.can_transition_to(GameStatus::InProgress));
        state.status = GameStatus::InProgress;
        tracing::info!(
            game_id = %state.game_id,
            first = ?first_player,
            "all players ready, battle started"
        );
    }

    Ok(ActionSummary::SetupCompleted {
        hp,
        hp_card_count,
        discarded,
        first_player,
    })
}

fn replace_shield(
    state: &mut GameState,
    actor_idx: usize,
    target_idx: usize,
) -> Result<ActionSummary, EngineError> {
    let new_shield = draw(state)?;
    let target = &mut state.players[target_idx];
    let old_shield = target.shield.replace(new_shield);
    let target_id = target.id.clone();
    state.discard_pile.extend(old_shield);
    advance_turn(state, actor_idx);
    Ok(ActionSummary::ShieldChanged {
        target: target_id,
        new_shield,
        old_shield,
    })
}

fn store_card(state: &mut GameState, actor_idx: usize) -> Result<ActionSummary, EngineError> {
    let card = draw(state)?;
    let player = &mut state.players[actor_idx];
    player.stored_cards.push(card);
    let stored_count = player.stored_cards.len();
    advance_turn(state, actor_idx);
    Ok(ActionSummary::CardStored { stored_count })
}

fn attack(
    state: &mut GameState,
    actor_idx: usize,
    target_idx: usize,
    stored_indices: &[usize],
) -> Result<ActionSummary, EngineError> {
    let drawn_card = draw(state)?;

    // -- Validated; mutate. --

    let attacker = &mut state.players[actor_idx];
    let stored_used: Vec<Card> = stored_indices
        .iter()
        .map(|&i| attacker.stored_cards[i])
        .collect();
    let mut spent = stored_indices.to_vec();
    spent.sort_unstable_by(|a, b| b.cmp(a));
    for i in spent {
        attacker.stored_cards.remove(i);
    }

    let defender = &mut state.players[target_idx];
    let target = defender.id.clone();
    let resolution = rules::resolve_attack(&drawn_card, &stored_used, defender.shield.as_ref());
    let eliminated = defender.take_damage(resolution.damage);
    let target_stored_lost = if resolution.damage > 0 {
        let lost = std::mem::take(&mut defender.stored_cards);
        let count = lost.len();
        state.discard_pile.extend(lost);
        count
    } else {
        0
    };
    let target_hp = state.players[target_idx].hp;

    state.discard_pile.push(drawn_card);
    state.discard_pile.extend(stored_used.iter().copied());

    if eliminated {
        tracing::info!(game_id = %state.game_id, player = %target, "player eliminated");
    }

    let game_over = rules::check_game_over(&state.players);
    if game_over.over {
        debug_assert!(state.status.can_transition_to(GameStatus::Finished));
        state.status = GameStatus::Finished;
        state.winner_id = game_over.winner_id.clone();
        tracing::info!(
            game_id = %state.game_id,
            winner = ?state.winner_id,
            "game finished"
        );
    } else {
        advance_turn(state, actor_idx);
    }

    Ok(ActionSummary::AttackResolved {
        target,
        drawn_card,
        stored_used,
        resolution,
        target_hp,
        target_stored_lost,
        eliminated,
        winner: game_over.winner_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};
    use crate::config::EngineConfig;
    use crate::deck::Deck;
    use crate::player::PlayerState;

    fn pid(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    #[test]
    fn test_check_indices_rejects_out_of_range() {
        let err = check_indices(&[0, 3], 3, "stored card").unwrap_err();
        assert!(matches!(err, EngineError::InvalidSelection(msg) if msg.contains("out of range")));
    }

    #[test]
    fn test_check_indices_rejects_repeats() {
        let err = check_indices(&[1, 0, 1], 3, "stored card").unwrap_err();
        assert!(matches!(err, EngineError::InvalidSelection(msg) if msg.contains("twice")));
    }

    #[test]
    fn test_check_indices_accepts_empty() {
        assert!(check_indices(&[], 0, "stored card").is_ok());
    }

    #[test]
    fn test_rejected_action_leaves_input_untouched() {
        // Battle state with an empty deck: every draw fails.
        let mut state = GameState::new(GameId::from("g"), EngineConfig::default());
        state.status = GameStatus::InProgress;
        state.current_player_id = Some(pid("a"));
        state.deck = Deck::default();
        for id in ["a", "b"] {
            state.players.push(PlayerState {
                hp: 5,
                setup_complete: true,
                stored_cards: vec![Card::new(Suit::Hearts, Rank::Two)],
                ..PlayerState::new(pid(id))
            });
        }
        let before = state.clone();

        let result = apply_action(
            &state,
            &pid("a"),
            &Action::Attack {
                target: pid("b"),
                stored_indices: vec![0],
            },
        );

        assert_eq!(result.unwrap_err(), EngineError::DeckExhausted);
        assert_eq!(state, before);
    }
}
