//! Four bots play one game of Turn Table Towers against an in-memory store.
//!
//! Every bot runs in its own task and only reacts to state-change
//! notifications, the way a remote client would. Setup races show the
//! optimistic-concurrency path: the loser gets a conflict and simply acts
//! again on the next state it sees.
//!
//! ```text
//! cargo run -p skirmish -- 42      # fixed seed
//! RUST_LOG=debug cargo run -p skirmish
//! ```

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;
use towers::prelude::*;

type Service = GameService<MemoryStore>;

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BotExit {
    /// The game reached `Finished`.
    GameOver,
    /// The bot needed a card and the deck was empty.
    Stalled,
}

/// Picks this bot's next action, or `None` if it has nothing to do.
fn decide(state: &GameState, me: &PlayerId, rng: &mut StdRng) -> Option<Action> {
    let mine = state.player(me)?;
    match state.status {
        GameStatus::Setup if !mine.setup_complete => {
            // Strongest card guards, the rest become HP.
            let shield_index = mine
                .hand
                .iter()
                .enumerate()
                .max_by_key(|(_, c)| c.value())
                .map(|(i, _)| i)?;
            let hp_indices = (0..mine.hand.len()).filter(|&i| i != shield_index).collect();
            Some(Action::Setup {
                shield_index,
                hp_indices,
            })
        }
        GameStatus::InProgress if state.current_player_id.as_ref() == Some(me) => {
            let target = state
                .active_players()
                .filter(|p| &p.id != me)
                .min_by_key(|p| p.hp)?;
            let own_shield = mine.shield.map_or(0, |c| c.value());
            let their_shield = target.shield.map_or(0, |c| c.value());

            if mine.stored_cards.len() >= 2 || rng.random_bool(0.3) {
                Some(Action::Attack {
                    target: target.id.clone(),
                    stored_indices: (0..mine.stored_cards.len()).collect(),
                })
            } else if own_shield < 6 && rng.random_bool(0.25) {
                Some(Action::ChangeOwnShield)
            } else if their_shield >= 10 && rng.random_bool(0.25) {
                Some(Action::ChangeOtherShield {
                    target: target.id.clone(),
                })
            } else {
                Some(Action::StoreCard)
            }
        }
        _ => None,
    }
}

async fn run_bot(
    service: Arc<Service>,
    mut rx: tokio::sync::broadcast::Receiver<Notification>,
    game_id: GameId,
    me: PlayerId,
    seed: u64,
) -> Result<BotExit, TowersError> {
    let mut rng = StdRng::seed_from_u64(seed);

    loop {
        let (version, state) = match rx.recv().await {
            Ok(Notification::StateChanged {
                game_id: changed,
                version,
                state,
            }) if changed == game_id => (version, state),
            Ok(_) => continue,
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(bot = %me, missed, "fell behind, reloading");
                let fresh = service.load(&game_id).await?;
                (fresh.version, Arc::new(fresh.state))
            }
            Err(RecvError::Closed) => return Ok(BotExit::GameOver),
        };

        if state.status.is_terminal() {
            return Ok(BotExit::GameOver);
        }
        let Some(action) = decide(&state, &me, &mut rng) else {
            continue;
        };

        match service.submit(&game_id, version, &me, &action).await {
            Ok(_) => {}
            Err(ServiceError::ConcurrentModification { expected, actual }) => {
                // The newer state is already queued on `rx`; decide again then.
                tracing::debug!(bot = %me, expected, actual, "lost a race, waiting for fresh state");
            }
            Err(ServiceError::Engine(EngineError::DeckExhausted)) => return Ok(BotExit::Stalled),
            Err(err) => return Err(err.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Commentary
// ---------------------------------------------------------------------------

fn describe(record: &ActionRecord) -> String {
    let actor = &record.actor;
    match &record.summary {
        ActionSummary::SetupCompleted {
            hp, first_player, ..
        } => match first_player {
            Some(first) => format!("{actor} is ready with {hp} HP; {first} opens the battle"),
            None => format!("{actor} is ready with {hp} HP"),
        },
        ActionSummary::ShieldChanged {
            target, new_shield, ..
        } if target == actor => format!("{actor} raises a new shield: {new_shield}"),
        ActionSummary::ShieldChanged {
            target, new_shield, ..
        } => format!("{actor} swaps {target}'s shield for {new_shield}"),
        ActionSummary::CardStored { stored_count } => {
            format!("{actor} stores a card ({stored_count} in reserve)")
        }
        ActionSummary::AttackResolved {
            target,
            drawn_card,
            resolution,
            target_hp,
            eliminated,
            ..
        } => {
            let mut line = format!(
                "{actor} attacks {target} with {drawn_card}: {} vs {}, {} damage, {target} at {target_hp} HP",
                resolution.attack_value, resolution.shield_value, resolution.damage
            );
            if *eliminated {
                line.push_str(&format!("; {target} is out"));
            }
            line
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random);
    tracing::info!(seed, "starting skirmish");

    let service = Arc::new(GameService::new(MemoryStore::new(), ServiceConfig::default())?);
    let game_id = GameId::from("skirmish");
    let players: Vec<PlayerId> = ["north", "east", "south", "west"]
        .into_iter()
        .map(PlayerId::from)
        .collect();

    // Subscribe before the game exists so nobody misses the first state.
    let mut commentary = service.subscribe();
    let commentator = tokio::spawn(async move {
        while let Ok(note) = commentary.recv().await {
            if let Notification::ActionApplied(record) = note {
                tracing::info!("{}", describe(&record));
            }
        }
    });

    let mut bots = JoinSet::new();
    for (i, me) in players.iter().enumerate() {
        bots.spawn(run_bot(
            Arc::clone(&service),
            service.subscribe(),
            game_id.clone(),
            me.clone(),
            seed.wrapping_add(i as u64 + 1),
        ));
    }

    service
        .start_game_with_rng(game_id.clone(), &players, &mut StdRng::seed_from_u64(seed))
        .await?;

    while let Some(joined) = bots.join_next().await {
        let exit = match joined {
            Ok(exit) => exit,
            Err(err) if err.is_cancelled() => continue,
            Err(err) => return Err(err.into()),
        };
        match exit {
            Ok(BotExit::GameOver) => {}
            Ok(BotExit::Stalled) => {
                tracing::info!("the deck ran dry before anyone won");
                bots.abort_all();
            }
            Err(err) => {
                bots.abort_all();
                return Err(err.into());
            }
        }
    }

    let final_state = service.load(&game_id).await?.state;
    // Let the commentator drain the last records before stopping it.
    tokio::task::yield_now().await;
    commentator.abort();

    match &final_state.winner_id {
        Some(winner) => tracing::info!(%winner, version = final_state.version, "game over"),
        None => tracing::info!(version = final_state.version, "game ended without a winner"),
    }
    for p in &final_state.players {
        tracing::info!(player = %p.id, hp = p.hp, eliminated = p.eliminated, "final standing");
    }
    Ok(())
}
