//! Rules engine and game state machine for Turn Table Towers.
//!
//! Everything in this crate is synchronous and pure: no I/O, no locks, no
//! clocks. The service layer loads a [`GameState`], calls
//! [`apply_action`], and commits the returned state.
//!
//! # Key types
//!
//! - [`Card`], [`Deck`] — the 52-card model
//! - [`PlayerState`] — one participant's hand, shield, HP, stored cards
//! - [`GameState`] — one game's authoritative state
//! - [`apply_action`] — the state machine's single transition function
//! - [`validate_attack_request`] — attack preconditions, checked without
//!   moving a card
//! - [`EngineConfig`], [`GameStatus`] — rules and lifecycle
//! - [`rules`] — pure helpers: setup validation, attack resolution, turn
//!   order, win detection

pub mod card;
mod config;
pub mod deck;
mod error;
mod machine;
mod player;
pub mod rules;
mod state;

pub use card::{Card, ParseCardError, Rank, Suit, card_value, is_valid_card};
pub use config::{EngineConfig, GameStatus, HpCardRule};
pub use deck::{DECK_SIZE, Deck, create_shuffled_deck, is_valid_deck};
pub use error::EngineError;
pub use machine::{ActionRecord, ActionSummary, Applied, apply_action, validate_attack_request};
pub use player::PlayerState;
pub use rules::{AttackResolution, GameOver};
pub use state::{GameState, GameView, InvariantViolation, PlayerView};
