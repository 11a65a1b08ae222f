//! The shared draw deck.
//!
//! A game owns exactly one [`Deck`]: built once at start, shuffled, then
//! only ever drawn from the top. Cards never return to it; spent cards go
//! to the game's discard pile instead.

use std::collections::{HashSet, VecDeque};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank, Suit};

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// An ordered pile of cards. The front is the top.
///
/// Serialized as a plain JSON array, top card first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// The 52 (suit, rank) combinations in construction order, unshuffled.
    pub fn standard() -> Self {
        let cards = Suit::ALL
            .into_iter()
            .flat_map(|suit| Rank::ALL.into_iter().map(move |rank| Card::new(suit, rank)))
            .collect();
        Self { cards }
    }

    /// A standard deck under a uniform random permutation (Fisher–Yates,
    /// via `rand`'s `SliceRandom::shuffle`).
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards: Vec<Card> = Self::standard().cards.into();
        cards.shuffle(rng);
        Self {
            cards: cards.into(),
        }
    }

    /// Wraps an explicit card order, top first. Used for fixtures and for
    /// restoring state; no validation is performed.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    /// Removes and returns the top card, or `None` if the deck is empty.
    ///
    /// An empty deck is a normal outcome here; the state machine turns it
    /// into `DeckExhausted` for the action that needed the card.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterates the remaining cards, top first.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

/// A freshly shuffled 52-card deck drawn with the thread-local RNG.
pub fn create_shuffled_deck() -> Deck {
    Deck::shuffled(&mut rand::rng())
}

/// True iff `cards` is a complete deck: exactly 52 cards, no duplicates.
pub fn is_valid_deck(cards: &[Card]) -> bool {
    if cards.len() != DECK_SIZE {
        return false;
    }
    let unique: HashSet<&Card> = cards.iter().collect();
    unique.len() == DECK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cards_of(deck: &Deck) -> Vec<Card> {
        deck.iter().copied().collect()
    }

    #[test]
    fn test_standard_deck_is_valid() {
        let deck = Deck::standard();
        assert_eq!(deck.len(), DECK_SIZE);
        assert!(is_valid_deck(&cards_of(&deck)));
    }

    #[test]
    fn test_create_shuffled_deck_has_thirteen_per_suit() {
        let deck = create_shuffled_deck();
        let cards = cards_of(&deck);

        assert_eq!(cards.len(), 52);
        assert!(is_valid_deck(&cards));
        for suit in Suit::ALL {
            let count = cards.iter().filter(|c| c.suit == suit).count();
            assert_eq!(count, 13, "suit {suit} should have 13 cards");
        }
    }

    #[test]
    fn test_shuffle_is_deterministic_for_a_seed() {
        let a = Deck::shuffled(&mut StdRng::seed_from_u64(7));
        let b = Deck::shuffled(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_permutes_the_standard_order() {
        let shuffled = Deck::shuffled(&mut StdRng::seed_from_u64(42));
        assert_ne!(shuffled, Deck::standard());
        assert!(is_valid_deck(&cards_of(&shuffled)));
    }

    #[test]
    fn test_draw_takes_from_the_top() {
        let top = Card::new(Suit::Hearts, Rank::Eight);
        let next = Card::new(Suit::Spades, Rank::Five);
        let mut deck = Deck::from_cards([top, next]);

        assert_eq!(deck.draw(), Some(top));
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.draw(), Some(next));
    }

    #[test]
    fn test_draw_from_empty_deck_is_none() {
        let mut deck = Deck::default();
        assert_eq!(deck.draw(), None);
        assert!(deck.is_empty());
    }

    #[test]
    fn test_is_valid_deck_rejects_duplicates_and_short_decks() {
        let mut cards = cards_of(&Deck::standard());
        cards.pop();
        assert!(!is_valid_deck(&cards));

        cards.push(cards[0]);
        assert_eq!(cards.len(), 52);
        assert!(!is_valid_deck(&cards));
    }

    #[test]
    fn test_deck_serializes_as_array() {
        let deck = Deck::from_cards([Card::new(Suit::Clubs, Rank::King)]);
        let json = serde_json::to_value(&deck).unwrap();
        assert_eq!(json, serde_json::json!([{ "suit": "clubs", "rank": "king" }]));
    }
}
