pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use config::{Config, MasteryThresholds, StoreConfig};
pub use database::ReviewStore;
pub use error::{FlashcardError, Result};
pub use models::{Deck, DeckCard, Flashcard, LearningSession, Rating, ReviewData};
