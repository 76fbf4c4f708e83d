//! Error types shared by the store, the exporter and the command line.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlashcardError>;

#[derive(Debug, Error)]
pub enum FlashcardError {
    /// Rating outside 0..=5 or not an integer.
    #[error("invalid rating '{0}': expected an integer between 0 and 5")]
    InvalidRating(String),

    #[error("flashcard {0} not found")]
    CardNotFound(i64),

    #[error("deck '{0}' not found")]
    DeckNotFound(String),

    #[error("deck '{0}' already exists")]
    DeckExists(String),

    /// Stored or imported review state outside the scheduler's domain.
    #[error("invalid review state for card {card}: {reason}")]
    InvalidReviewState { card: i64, reason: String },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FlashcardError {
    /// Deterministic input errors that a caller should report back to the
    /// user rather than retry.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FlashcardError::InvalidRating(_)
                | FlashcardError::CardNotFound(_)
                | FlashcardError::DeckNotFound(_)
                | FlashcardError::DeckExists(_)
                | FlashcardError::EmptyField(_)
                | FlashcardError::InvalidReviewState { .. }
        )
    }
}

impl From<toml::de::Error> for FlashcardError {
    fn from(err: toml::de::Error) -> Self {
        FlashcardError::Config(err.to_string())
    }
}
