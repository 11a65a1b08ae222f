//! Per-player state.

use serde::{Deserialize, Serialize};
use towers_protocol::PlayerId;

use crate::card::{Card, total_value};

/// Everything the engine tracks about one participant.
///
/// The hand only matters during setup: it is dealt at start and emptied
/// when the player commits their shield and HP cards. After that `hp` is
/// the authoritative health; `hp_cards` stays as a record of the choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,

    /// Cards dealt at start, consumed by setup.
    pub hand: Vec<Card>,

    /// The single defensive card, if any.
    pub shield: Option<Card>,

    /// Cards chosen at setup whose sum became the starting HP.
    pub hp_cards: Vec<Card>,

    /// Remaining health. Only ever decreases once set.
    pub hp: u32,

    /// Cards banked with the store action, spent on attacks.
    pub stored_cards: Vec<Card>,

    pub setup_complete: bool,

    /// Always equal to `hp == 0` once setup is complete.
    pub eliminated: bool,
}

impl PlayerState {
    /// A participant with nothing dealt yet.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            hand: Vec::new(),
            shield: None,
            hp_cards: Vec::new(),
            hp: 0,
            stored_cards: Vec::new(),
            setup_complete: false,
            eliminated: false,
        }
    }

    /// Returns `true` if the player can still act and be targeted.
    pub fn is_active(&self) -> bool {
        self.setup_complete && !self.eliminated
    }

    /// Number of cards this player currently holds in any collection.
    pub fn card_count(&self) -> usize {
        self.hand.len()
            + usize::from(self.shield.is_some())
            + self.hp_cards.len()
            + self.stored_cards.len()
    }

    /// Iterates every card the player holds: hand, shield, HP cards, stored.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.hand
            .iter()
            .chain(self.shield.iter())
            .chain(self.hp_cards.iter())
            .chain(self.stored_cards.iter())
    }

    /// Sum of the stored cards' values, i.e. the bonus available to the
    /// next attack if everything is spent.
    pub fn stored_value(&self) -> u32 {
        total_value(&self.stored_cards)
    }

    /// Applies `damage`, flooring HP at zero, and keeps `eliminated`
    /// consistent. Returns `true` if this hit eliminated the player.
    pub(crate) fn take_damage(&mut self, damage: u32) -> bool {
        let was_eliminated = self.eliminated;
        self.hp = self.hp.saturating_sub(damage);
        self.eliminated = self.hp == 0;
        self.eliminated && !was_eliminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn ready_player(hp: u32) -> PlayerState {
        PlayerState {
            hp,
            setup_complete: true,
            ..PlayerState::new(PlayerId::from("p1"))
        }
    }

    #[test]
    fn test_new_player_is_empty() {
        let p = PlayerState::new(PlayerId::from("p1"));
        assert_eq!(p.card_count(), 0);
        assert!(!p.setup_complete);
        assert!(!p.is_active());
    }

    #[test]
    fn test_take_damage_eliminates_at_zero() {
        let mut p = ready_player(3);
        assert!(p.take_damage(5));
        assert_eq!(p.hp, 0);
        assert!(p.eliminated);
    }

    #[test]
    fn test_take_damage_partial_keeps_player_alive() {
        let mut p = ready_player(10);
        assert!(!p.take_damage(4));
        assert_eq!(p.hp, 6);
        assert!(!p.eliminated);
        assert!(p.is_active());
    }

    #[test]
    fn test_take_zero_damage_changes_nothing() {
        let mut p = ready_player(7);
        assert!(!p.take_damage(0));
        assert_eq!(p.hp, 7);
    }

    #[test]
    fn test_card_count_includes_every_collection() {
        let mut p = ready_player(5);
        p.hand.push(Card::new(Suit::Hearts, Rank::Two));
        p.shield = Some(Card::new(Suit::Hearts, Rank::Three));
        p.hp_cards.push(Card::new(Suit::Hearts, Rank::Five));
        p.stored_cards.push(Card::new(Suit::Clubs, Rank::Four));
        p.stored_cards.push(Card::new(Suit::Clubs, Rank::Six));

        assert_eq!(p.card_count(), 5);
        assert_eq!(p.cards().count(), 5);
        assert_eq!(p.stored_value(), 10);
    }
}
