//! Recall quality given by the user when reviewing a card.
//! 0 = complete blackout, 5 = perfect response. 3 and above counts as a pass.

use crate::error::{FlashcardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_RATING: u8 = 5;
pub const PASSING_GRADE: u8 = 3;

/// A rating that is known to be in `0..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self> {
        if (0..=MAX_RATING as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(FlashcardError::InvalidRating(value.to_string()))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self.0 >= PASSING_GRADE
    }
}

impl TryFrom<i64> for Rating {
    type Error = FlashcardError;

    fn try_from(value: i64) -> Result<Self> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl FromStr for Rating {
    type Err = FlashcardError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| FlashcardError::InvalidRating(s.to_string()))?;
        Rating::new(value)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
