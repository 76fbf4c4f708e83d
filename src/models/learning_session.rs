//! Learning session management for spaced repetition practice.
//! Handles multi-round flashcard review with SM-2 algorithm integration.

use super::{LearningCard, Rating, ReviewData};
use crate::database::ReviewStore;
use crate::error::Result;
use log::debug;

/// Manages a learning session with multiple review rounds.
/// Cards that aren't passed (rating < 3) are repeated in subsequent rounds.
pub struct LearningSession {
    pub deck_name: String,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_definition: bool,
    pub round_number: usize,
}

impl LearningSession {
    /// Creates a new learning session from cards that are due for review.
    pub fn new_from_due_cards(store: &ReviewStore, deck_name: &str) -> Result<Self> {
        let learning_cards: Vec<_> = store
            .due_cards(deck_name)?
            .into_iter()
            .map(LearningCard::new)
            .collect();

        let indices: Vec<usize> = (0..learning_cards.len()).collect();

        Ok(Self {
            deck_name: deck_name.to_string(),
            all_cards: learning_cards,
            current_round_cards: indices,
            current_index: 0,
            show_definition: false,
            round_number: 1,
        })
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn toggle_definition(&mut self) {
        self.show_definition = !self.show_definition;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_definition = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with cards that weren't passed.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|card| !card.is_learned)
                    .unwrap_or(false)
            })
            .collect();

        if !failed_indices.is_empty() {
            self.current_round_cards = failed_indices;
            self.current_index = 0;
            self.show_definition = false;
            self.round_number += 1;
            debug!(
                "Deck '{}' round {} with {} cards",
                self.deck_name,
                self.round_number,
                self.current_round_cards.len()
            );
        }
    }

    /// Rates the current card through the store and records the result for this round.
    /// Returns the updated review data, or `None` when there is no current card.
    pub fn grade_current_card(
        &mut self,
        store: &mut ReviewStore,
        rating: Rating,
    ) -> Result<Option<ReviewData>> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.all_cards.get_mut(idx) else {
            return Ok(None);
        };

        let review = store.rate_card(card.id(), rating)?;
        if rating.is_passing() {
            card.mark_as_learned(store.current_date()?);
        } else {
            card.is_learned = false;
        }
        card.card.review = review.clone();

        Ok(Some(review))
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|card| card.is_learned)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// True when the current round is empty or every card in it is passed.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
