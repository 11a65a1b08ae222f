//! Identity and action types that cross the engine boundary.
//!
//! These are the values a client hands to the service ("I am `player3`,
//! attack `player1` with my stored cards 0 and 2") and the ids the store
//! and notification collaborators key their data by.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable, opaque identifier for a player.
///
/// The identity collaborator decides what these look like (auth user ids,
/// UUIDs, handles). The engine only compares them for equality and uses
/// them as map keys.
///
/// `#[serde(transparent)]` keeps the wire form a bare string:
/// `PlayerId("player1")` serializes as `"player1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A unique identifier for one game instance (one room's match).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for GameId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Action — what a player asks for
// ---------------------------------------------------------------------------

/// A player's requested action against a game.
///
/// Indices refer to positions in the actor's own collections at the time
/// the request is evaluated: `shield_index`/`hp_indices` index into the
/// dealt hand, `stored_indices` into the stored cards.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` produces internally
/// tagged JSON: `{ "type": "attack", "target": "p2", "stored_indices": [0] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Choose a shield and HP cards from the dealt hand.
    ///
    /// Hand cards picked as neither shield nor HP are moved to the
    /// discard pile.
    Setup {
        shield_index: usize,
        hp_indices: Vec<usize>,
    },

    /// Draw a card and make it your shield, discarding the old one.
    ChangeOwnShield,

    /// Draw a card and make it `target`'s shield, discarding theirs.
    ChangeOtherShield { target: PlayerId },

    /// Draw a card and bank it for a later attack.
    StoreCard,

    /// Draw an attack card, add the chosen stored cards, and hit `target`.
    Attack {
        target: PlayerId,
        #[serde(default)]
        stored_indices: Vec<usize>,
    },
}

impl Action {
    /// Returns the payload-free kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Setup { .. } => ActionKind::Setup,
            Self::ChangeOwnShield => ActionKind::ChangeOwnShield,
            Self::ChangeOtherShield { .. } => ActionKind::ChangeOtherShield,
            Self::StoreCard => ActionKind::StoreCard,
            Self::Attack { .. } => ActionKind::Attack,
        }
    }

    /// Returns the targeted player, if this action has one.
    pub fn target(&self) -> Option<&PlayerId> {
        match self {
            Self::ChangeOtherShield { target } | Self::Attack { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// The kind of an [`Action`], without its payload.
///
/// Used in logs and action records where the payload is summarized
/// separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Setup,
    ChangeOwnShield,
    ChangeOtherShield,
    StoreCard,
    Attack,
}

impl ActionKind {
    /// Returns the snake_case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::ChangeOwnShield => "change_own_shield",
            Self::ChangeOtherShield => "change_other_shield",
            Self::StoreCard => "store_card",
            Self::Attack => "attack",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
// Tests
// =========================================================================
