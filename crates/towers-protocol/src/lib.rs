//! Boundary vocabulary for Turn Table Towers.
//!
//! This crate defines what crosses the edge of the engine:
//!
//! - **Identity** ([`PlayerId`], [`GameId`]) — opaque ids supplied by the
//!   identity and room collaborators. The engine never authenticates; it
//!   only checks whether an id may act.
//! - **Actions** ([`Action`], [`ActionKind`]) — what a player asks the
//!   engine to do on their behalf.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how a state blob is
//!   turned into bytes for the persistence collaborator.
//! - **Errors** ([`ProtocolError`]) — encode/decode failures.
//!
//! ```text
//! Client intent (Action) → Service → Engine → Store (Codec bytes)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Action, ActionKind, GameId, PlayerId};
