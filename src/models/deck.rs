//! Deck is a named set of flashcards together with their review state
use super::{Flashcard, ReviewData};
use crate::config::MasteryThresholds;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct DeckCard {
    pub id: i64,
    pub flashcard: Flashcard,
    pub review: ReviewData,
}

#[derive(Clone, Debug)]
pub struct Deck {
    pub name: String,
    pub cards: Vec<DeckCard>,
}

impl Deck {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cards: Vec::new(),
        }
    }

    pub fn card(&self, id: i64) -> Option<&DeckCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn stats(&self, now: DateTime<Utc>, thresholds: &MasteryThresholds) -> DeckStats {
        let reviews = || self.cards.iter().map(|card| &card.review);

        let average_ease_factor = if self.cards.is_empty() {
            0.0
        } else {
            reviews().map(|r| r.ease_factor).sum::<f64>() / self.cards.len() as f64
        };

        DeckStats {
            total: self.cards.len(),
            due: reviews().filter(|r| r.is_due(now)).count(),
            mastered: reviews().filter(|r| r.is_mastered(thresholds)).count(),
            reviewed: reviews().filter(|r| r.review_count > 0).count(),
            average_ease_factor,
        }
    }
}

/// Aggregate numbers for one deck.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeckStats {
    pub total: usize,
    pub due: usize,
    pub mastered: usize,
    /// Cards reviewed at least once.
    pub reviewed: usize,
    pub average_ease_factor: f64,
}
