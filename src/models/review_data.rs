//! Scheduling state of a single flashcard plus the review bookkeeping kept next to it.

use super::Rating;
use super::sm2::{self, SchedulingState};
use crate::config::MasteryThresholds;
use crate::error::{FlashcardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewData {
    pub flashcard_id: i64,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub review_count: u32,
    pub correct_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewData {
    /// Fresh card, due immediately.
    pub fn new(flashcard_id: i64, created_at: DateTime<Utc>, initial_ease_factor: f64) -> Self {
        Self {
            flashcard_id,
            ease_factor: initial_ease_factor,
            interval_days: 0,
            repetitions: 0,
            next_review: created_at,
            review_count: 0,
            correct_count: 0,
            last_reviewed_at: None,
        }
    }

    /// Checks that the state can be fed back into the scheduler.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| FlashcardError::InvalidReviewState {
            card: self.flashcard_id,
            reason,
        };

        if !self.ease_factor.is_finite() || self.ease_factor < sm2::MIN_EASE_FACTOR {
            return Err(invalid(format!(
                "ease factor {} is below {} or not finite",
                self.ease_factor,
                sm2::MIN_EASE_FACTOR
            )));
        }
        if self.interval_days > sm2::MAX_INTERVAL_DAYS {
            return Err(invalid(format!(
                "interval of {} days exceeds {}",
                self.interval_days,
                sm2::MAX_INTERVAL_DAYS
            )));
        }
        if self.correct_count > self.review_count {
            return Err(invalid(format!(
                "{} correct out of {} reviews",
                self.correct_count, self.review_count
            )));
        }
        Ok(())
    }

    pub fn scheduling_state(&self) -> SchedulingState {
        SchedulingState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
        }
    }

    /// Runs SM-2 for `rating` and records the review.
    pub fn apply_rating(&mut self, rating: Rating, now: DateTime<Utc>) {
        let next = sm2::calculate_next_review(&self.scheduling_state(), rating, now);

        self.ease_factor = next.ease_factor;
        self.interval_days = next.interval_days;
        self.repetitions = next.repetitions;
        self.next_review = next.next_review;

        self.review_count += 1;
        if rating.is_passing() {
            self.correct_count += 1;
        }
        self.last_reviewed_at = Some(now);
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    pub fn is_mastered(&self, thresholds: &MasteryThresholds) -> bool {
        self.ease_factor >= thresholds.min_ease_factor
            && self.interval_days >= thresholds.min_interval_days
    }

    /// Share of reviews that passed, 0.0 for a card never reviewed.
    pub fn accuracy(&self) -> f64 {
        if self.review_count == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.review_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_card_is_due_immediately() {
        let review = ReviewData::new(1, start(), sm2::DEFAULT_EASE_FACTOR);
        assert!(review.is_due(start()));
        assert_eq!(review.interval_days, 0);
        assert_eq!(review.last_reviewed_at, None);
    }

    #[test]
    fn test_apply_rating_updates_bookkeeping() {
        let mut review = ReviewData::new(1, start(), sm2::DEFAULT_EASE_FACTOR);

        review.apply_rating(Rating::new(4).unwrap(), start());
        review.apply_rating(Rating::new(1).unwrap(), start());

        assert_eq!(review.review_count, 2);
        assert_eq!(review.correct_count, 1);
        assert_eq!(review.last_reviewed_at, Some(start()));
        assert_eq!(review.repetitions, 0);
        assert_eq!(review.next_review, start() + Duration::days(1));
        assert!((review.accuracy() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_not_due_until_interval_passes() {
        let mut review = ReviewData::new(1, start(), sm2::DEFAULT_EASE_FACTOR);
        review.apply_rating(Rating::new(5).unwrap(), start());

        assert!(!review.is_due(start()));
        assert!(review.is_due(start() + Duration::days(1)));
    }

    #[test]
    fn test_mastered() {
        let thresholds = MasteryThresholds::default();
        let mut review = ReviewData::new(1, start(), sm2::DEFAULT_EASE_FACTOR);
        assert!(!review.is_mastered(&thresholds));

        review.interval_days = 21;
        assert!(review.is_mastered(&thresholds));

        review.ease_factor = 2.4;
        assert!(!review.is_mastered(&thresholds));
    }

    #[test]
    fn test_validate() {
        let review = ReviewData::new(4, start(), sm2::DEFAULT_EASE_FACTOR);
        assert!(review.validate().is_ok());

        let low_ef = ReviewData {
            ease_factor: 0.2,
            ..review.clone()
        };
        assert!(matches!(
            low_ef.validate(),
            Err(FlashcardError::InvalidReviewState { card: 4, .. })
        ));

        let infinite_ef = ReviewData {
            ease_factor: f64::INFINITY,
            ..review.clone()
        };
        assert!(infinite_ef.validate().is_err());

        let long_interval = ReviewData {
            interval_days: sm2::MAX_INTERVAL_DAYS + 1,
            ..review.clone()
        };
        assert!(long_interval.validate().is_err());

        let miscounted = ReviewData {
            correct_count: 3,
            review_count: 2,
            ..review
        };
        assert!(miscounted.validate().is_err());
    }

    #[test]
    fn test_accuracy_without_reviews() {
        let review = ReviewData::new(1, start(), sm2::DEFAULT_EASE_FACTOR);
        assert_eq!(review.accuracy(), 0.0);
    }
}
