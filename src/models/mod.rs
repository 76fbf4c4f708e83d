pub mod deck;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod rating;
pub mod review_data;
pub mod sm2;

pub use deck::{Deck, DeckCard, DeckStats};
pub use flashcard::Flashcard;
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use rating::Rating;
pub use review_data::ReviewData;
