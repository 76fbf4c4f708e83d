//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates review intervals based on recall quality:
//! - Each card has an easiness factor (EF) that adjusts based on performance
//! - Ratings 0-2: repetitions reset and the card comes back the next day
//! - Ratings 3-5: interval grows progressively (1 day → 6 days → EF multiplier)
//! - EF is adjusted after every review, failed ones included, and never drops below 1.3
//!
//! Interval growth uses the EF the card had *before* this review. Products are
//! rounded with `f64::round` (half away from zero) and capped at
//! `MAX_INTERVAL_DAYS`, so a long streak of perfect ratings settles at roughly
//! a century instead of running past the calendar. A `next_review` that would
//! still fall beyond the last representable date saturates to that date.

use super::Rating;
use chrono::{DateTime, Duration, Utc};

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const FIRST_INTERVAL_DAYS: u32 = 1;
pub const SECOND_INTERVAL_DAYS: u32 = 6;
/// Interval given to a card after a failed review.
pub const RELEARN_INTERVAL_DAYS: u32 = 1;
/// Upper bound on any scheduled interval (about 100 years).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// The part of a card the scheduler reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulingState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledReview {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
}

impl ScheduledReview {
    pub fn state(&self) -> SchedulingState {
        SchedulingState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
        }
    }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), clamped at 1.3
pub fn next_ease_factor(ease_factor: f64, rating: Rating) -> f64 {
    let miss = 5.0 - rating.value() as f64;
    let updated = ease_factor + (0.1 - miss * (0.08 + miss * 0.02));
    updated.max(MIN_EASE_FACTOR)
}

/// Calculates the next scheduling state of a card rated at `now`.
pub fn calculate_next_review(
    state: &SchedulingState,
    rating: Rating,
    now: DateTime<Utc>,
) -> ScheduledReview {
    let (interval_days, repetitions) = if rating.is_passing() {
        let interval = match state.repetitions {
            0 => FIRST_INTERVAL_DAYS,
            1 => SECOND_INTERVAL_DAYS,
            _ => grown_interval(state.interval_days, state.ease_factor),
        };
        (interval, state.repetitions.saturating_add(1))
    } else {
        (RELEARN_INTERVAL_DAYS, 0)
    };

    let ease_factor = next_ease_factor(state.ease_factor, rating);

    ScheduledReview {
        ease_factor,
        interval_days,
        repetitions,
        next_review: review_date(now, interval_days),
    }
}

fn grown_interval(interval_days: u32, ease_factor: f64) -> u32 {
    let grown = (interval_days as f64 * ease_factor).round();
    // NaN falls through `min` to the cap; the cast saturates at 0 for negatives
    grown.min(MAX_INTERVAL_DAYS as f64) as u32
}

fn review_date(now: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(interval_days as i64))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
