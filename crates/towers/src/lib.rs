//! # Towers
//!
//! Authoritative multiplayer engine for the Turn Table Towers card battle.
//!
//! Clients send an [`Action`](towers_protocol::Action); the
//! [`GameService`](towers_service::GameService) loads the game from a
//! [`GameStore`](towers_store::GameStore), runs it through the rules
//! engine, and commits the result only if nobody else got there first.
//!
//! ## Quick Start
//!
//! ```rust
//! use towers::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), TowersError> {
//! let service = GameService::new(MemoryStore::new(), ServiceConfig::default())?;
//! let game = GameId::from("table-1");
//! let players = [PlayerId::from("alice"), PlayerId::from("bob")];
//!
//! service.start_game(game.clone(), &players).await?;
//! for p in &players {
//!     let setup = Action::Setup { shield_index: 0, hp_indices: vec![1, 2, 3] };
//!     service.apply_action(&game, p, &setup).await?;
//! }
//! assert_eq!(service.load(&game).await?.state.status, GameStatus::InProgress);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod telemetry;

pub use towers_engine as engine;
pub use towers_protocol as protocol;
pub use towers_service as service;
pub use towers_store as store;

pub use error::TowersError;

pub mod prelude {
    pub use crate::TowersError;
    pub use crate::telemetry::init_tracing;
    pub use towers_engine::{
        ActionRecord, ActionSummary, Card, EngineConfig, EngineError, GameState, GameStatus,
        GameView, HpCardRule, PlayerState, Rank, Suit,
    };
    pub use towers_protocol::{Action, ActionKind, GameId, PlayerId};
    pub use towers_service::{ActionOutcome, GameService, Notification, ServiceConfig, ServiceError};
    pub use towers_store::{GameStore, MemoryStore, StoreError, Versioned};
}
