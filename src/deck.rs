//! The 78-card tarot deck
//!
//! The deck is built once from a fixed name table and shared process-wide.
//! Card ids and image references are derived from each card's position.

use std::sync::OnceLock;

/// Number of cards in a full tarot deck
pub const DECK_SIZE: usize = 78;

/// Number of display groups the selection grid is split into
pub const SPREAD_COUNT: usize = 3;

/// Shared card back image, relative to the assets directory
pub const BACK_IMAGE: &str = "images/cards/tarot-back.png";

/// Intro clip shown on the welcome screen, relative to the assets directory
pub const INTRO_VIDEO: &str = "videos/tarot-intro.mp4";

/// Card names in deck order: major arcana, then wands, cups, swords, pentacles
#[rustfmt::skip]
pub const TAROT_NAMES: [&str; DECK_SIZE] = [
    "The Fool", "The Magician", "The High Priestess", "The Empress", "The Emperor",
    "The Hierophant", "The Lovers", "The Chariot", "Strength", "The Hermit",
    "Wheel of Fortune", "Justice", "The Hanged Man", "Death", "Temperance",
    "The Devil", "The Tower", "The Star", "The Moon", "The Sun",
    "Judgement", "The World",
    "Ace of Wands", "Two of Wands", "Three of Wands", "Four of Wands", "Five of Wands",
    "Six of Wands", "Seven of Wands", "Eight of Wands", "Nine of Wands", "Ten of Wands",
    "Page of Wands", "Knight of Wands", "Queen of Wands", "King of Wands",
    "Ace of Cups", "Two of Cups", "Three of Cups", "Four of Cups", "Five of Cups",
    "Six of Cups", "Seven of Cups", "Eight of Cups", "Nine of Cups", "Ten of Cups",
    "Page of Cups", "Knight of Cups", "Queen of Cups", "King of Cups",
    "Ace of Swords", "Two of Swords", "Three of Swords", "Four of Swords", "Five of Swords",
    "Six of Swords", "Seven of Swords", "Eight of Swords", "Nine of Swords", "Ten of Swords",
    "Page of Swords", "Knight of Swords", "Queen of Swords", "King of Swords",
    "Ace of Pentacles", "Two of Pentacles", "Three of Pentacles", "Four of Pentacles", "Five of Pentacles",
    "Six of Pentacles", "Seven of Pentacles", "Eight of Pentacles", "Nine of Pentacles", "Ten of Pentacles",
    "Page of Pentacles", "Knight of Pentacles", "Queen of Pentacles", "King of Pentacles",
];

/// Immutable description of one card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardDescriptor {
    /// Unique token, `card_{index}`
    pub id: String,
    /// Display name from [`TAROT_NAMES`]
    pub name: &'static str,
    /// Image shown while the card is face down
    pub back_image: &'static str,
    /// Image shown once the card is picked, `tarot-front-{index + 1}.jpg`
    pub front_image: String,
}

impl CardDescriptor {
    fn at(index: usize, name: &'static str) -> Self {
        Self {
            id: format!("card_{}", index),
            name,
            back_image: BACK_IMAGE,
            front_image: format!("images/cards/tarot-front-{}.jpg", index + 1),
        }
    }
}

/// Ordered, index-stable sequence of all 78 cards
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<CardDescriptor>,
}

impl Deck {
    /// Build the deck from the name table
    pub fn build() -> Self {
        let cards = TAROT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| CardDescriptor::at(i, name))
            .collect();
        Self { cards }
    }

    /// All cards in deck order
    pub fn cards(&self) -> &[CardDescriptor] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Look up a card by its id
    pub fn get(&self, id: &str) -> Option<&CardDescriptor> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Look up a card by its position
    pub fn by_index(&self, index: usize) -> Option<&CardDescriptor> {
        self.cards.get(index)
    }

    /// Split the deck into `count` display groups of `ceil(len / count)` cards
    ///
    /// The last group may be shorter. A `count` of zero yields no groups.
    pub fn spreads(&self, count: usize) -> Vec<&[CardDescriptor]> {
        if count == 0 || self.cards.is_empty() {
            return Vec::new();
        }
        let per_spread = self.cards.len().div_ceil(count);
        self.cards.chunks(per_spread).collect()
    }
}

/// The process-wide deck, built on first use
pub fn deck() -> &'static Deck {
    static DECK: OnceLock<Deck> = OnceLock::new();
    DECK.get_or_init(Deck::build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deck_has_78_cards_in_table_order() {
        let deck = Deck::build();
        assert_eq!(deck.len(), DECK_SIZE);
        for (card, name) in deck.cards().iter().zip(TAROT_NAMES.iter()) {
            assert_eq!(card.name, *name);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let deck = Deck::build();
        let ids: HashSet<&str> = deck.cards().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), DECK_SIZE);
    }

    #[test]
    fn test_image_references_follow_position() {
        let deck = Deck::build();
        let first = deck.by_index(0).unwrap();
        assert_eq!(first.id, "card_0");
        assert_eq!(first.front_image, "images/cards/tarot-front-1.jpg");
        assert_eq!(first.back_image, BACK_IMAGE);

        let last = deck.by_index(77).unwrap();
        assert_eq!(last.id, "card_77");
        assert_eq!(last.name, "King of Pentacles");
        assert_eq!(last.front_image, "images/cards/tarot-front-78.jpg");
    }

    #[test]
    fn test_scenario_cards() {
        let deck = Deck::build();
        assert_eq!(deck.get("card_0").unwrap().name, "The Fool");
        assert_eq!(deck.get("card_5").unwrap().name, "The Hierophant");
        assert_eq!(deck.get("card_27").unwrap().name, "Six of Wands");
        assert_eq!(deck.get("card_10").unwrap().name, "Wheel of Fortune");
        assert!(deck.get("card_78").is_none());
    }

    #[test]
    fn test_three_spreads_of_26() {
        let deck = Deck::build();
        let spreads = deck.spreads(SPREAD_COUNT);
        assert_eq!(spreads.len(), 3);
        assert!(spreads.iter().all(|s| s.len() == 26));
        assert_eq!(spreads[1][0].id, "card_26");
    }

    #[test]
    fn test_uneven_spreads_use_ceil_size() {
        let deck = Deck::build();
        let spreads = deck.spreads(5);
        // ceil(78 / 5) = 16 → 16, 16, 16, 16, 14
        assert_eq!(spreads.len(), 5);
        assert_eq!(spreads[0].len(), 16);
        assert_eq!(spreads[4].len(), 14);
        assert!(deck.spreads(0).is_empty());
    }

    #[test]
    fn test_shared_deck_is_singleton() {
        assert!(std::ptr::eq(deck(), deck()));
    }
}
