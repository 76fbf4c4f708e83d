//! Card shown in a learning session, with its progress in the current round.
use super::{DeckCard, ReviewData};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub card: DeckCard,
    pub is_learned: bool,
    pub last_learned_at: Option<DateTime<Utc>>,
}

impl LearningCard {
    pub fn new(card: DeckCard) -> Self {
        Self {
            card,
            is_learned: false,
            last_learned_at: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.card.id
    }

    pub fn review(&self) -> &ReviewData {
        &self.card.review
    }

    pub fn mark_as_learned(&mut self, at: DateTime<Utc>) {
        self.is_learned = true;
        self.last_learned_at = Some(at);
    }
}
