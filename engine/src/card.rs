use std::fmt;

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{bad_card, deck_exhausted, EngineResult};

/// A card suit. Ordered only for deterministic iteration, not for rank comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }

    fn from_char(c: char) -> Option<Suit> {
        match c.to_ascii_uppercase() {
            'C' => Some(Suit::Clubs),
            'D' => Some(Suit::Diamonds),
            'H' => Some(Suit::Hearts),
            'S' => Some(Suit::Spades),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Card rank. `u8` value matches its face value (2..=14, Ace high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    fn from_value(value: u8) -> Option<Rank> {
        Rank::ALL.iter().copied().find(|r| r.value() == value)
    }

    fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    fn from_char(c: char) -> Option<Rank> {
        match c.to_ascii_uppercase() {
            '2' => Some(Rank::Two),
            '3' => Some(Rank::Three),
            '4' => Some(Rank::Four),
            '5' => Some(Rank::Five),
            '6' => Some(Rank::Six),
            '7' => Some(Rank::Seven),
            '8' => Some(Rank::Eight),
            '9' => Some(Rank::Nine),
            'T' => Some(Rank::Ten),
            'J' => Some(Rank::Jack),
            'Q' => Some(Rank::Queen),
            'K' => Some(Rank::King),
            'A' => Some(Rank::Ace),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// An immutable playing card. Canonical text form is `"<rank><suit>"`, e.g. `"AS"`, `"TD"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Parses the canonical two-character form. Fails with `BAD_CARD` on anything else.
    pub fn parse(s: &str) -> EngineResult<Card> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return Err(bad_card(format!("card must be 2 characters, got {s:?}")));
        }
        let rank = Rank::from_char(chars[0]).ok_or_else(|| bad_card(format!("bad rank in {s:?}")))?;
        let suit = Suit::from_char(chars[1]).ok_or_else(|| bad_card(format!("bad suit in {s:?}")))?;
        Ok(Card::new(rank, suit))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// An ordered 52-card sequence with a dealing cursor. Created fresh per hand.
///
/// Invariant: no card appears twice; `cursor <= 52`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
}

impl Deck {
    /// The 52 cards in a fixed, unshuffled order.
    pub fn ordered() -> Vec<Card> {
        let mut cards = Vec::with_capacity(52);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        cards
    }

    /// Produces a uniformly shuffled deck using the supplied RNG (Fisher-Yates via
    /// `rand::seq::SliceRandom`). Production code seeds from the process CSPRNG
    /// (`rand::rng()`); tests inject a seeded `StdRng` for determinism. The seed
    /// itself is never retained or exposed by this type.
    pub fn new_shuffled(rng: &mut impl RngCore) -> Self {
        let mut cards = Self::ordered();
        cards.shuffle(rng);
        Self { cards, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }

    /// Deals `n` cards, advancing the cursor. Fails with `DECK_EXHAUSTED` rather
    /// than panicking if fewer than `n` cards remain.
    pub fn deal(&mut self, n: usize) -> EngineResult<Vec<Card>> {
        if self.cursor + n > self.cards.len() {
            return Err(deck_exhausted(format!(
                "cannot deal {n} card(s): only {} remain",
                self.remaining()
            )));
        }
        let dealt = self.cards[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        Ok(dealt)
    }

    /// Advances the cursor by one without returning a card. Used before
    /// flop/turn/river in this engine's burn policy (see DESIGN.md).
    pub fn burn(&mut self) -> EngineResult<()> {
        self.deal(1).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn ordered_deck_has_52_unique_cards() {
        let cards = Deck::ordered();
        assert_eq!(cards.len(), 52);
        let unique: HashSet<_> = cards.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn shuffle_preserves_uniqueness_and_is_deterministic_under_seed() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let deck1 = Deck::new_shuffled(&mut rng1);
        let deck2 = Deck::new_shuffled(&mut rng2);
        assert_eq!(deck1.cards, deck2.cards);
        let unique: HashSet<_> = deck1.cards.iter().collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn deal_advances_cursor_and_exhausts() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = Deck::new_shuffled(&mut rng);
        let first = deck.deal(2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(deck.cursor(), 2);
        assert!(deck.deal(51).is_err());
    }

    #[test]
    fn burn_advances_cursor_by_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = Deck::new_shuffled(&mut rng);
        deck.burn().unwrap();
        assert_eq!(deck.cursor(), 1);
    }

    #[test]
    fn parse_roundtrips_display() {
        let c = Card::parse("AS").unwrap();
        assert_eq!(c.rank, Rank::Ace);
        assert_eq!(c.suit, Suit::Spades);
        assert_eq!(format!("{c}"), "AS");
        assert_eq!(Card::parse("Td").unwrap().to_string(), "TD");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Card::parse("Z9").is_err());
        assert!(Card::parse("A").is_err());
        assert!(Card::parse("ASS").is_err());
    }
}
