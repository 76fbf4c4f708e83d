//! Flashcard is a pair <term, definition>. Only text is used in terms and definitions
use crate::error::{FlashcardError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

impl Flashcard {
    /// Builds a card from user input, trimming both sides.
    pub fn new(term: &str, definition: &str) -> Result<Self> {
        let term = term.trim();
        let definition = definition.trim();
        if term.is_empty() {
            return Err(FlashcardError::EmptyField("term"));
        }
        if definition.is_empty() {
            return Err(FlashcardError::EmptyField("definition"));
        }
        Ok(Self {
            term: term.to_string(),
            definition: definition.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashcard_creation() {
        let card = Flashcard::new(" photosynthesis ", "light to sugar").unwrap();

        assert_eq!(card.term, "photosynthesis");
        assert_eq!(card.definition, "light to sugar");
    }

    #[test]
    fn test_flashcard_rejects_blank_fields() {
        assert!(matches!(
            Flashcard::new("  ", "x"),
            Err(FlashcardError::EmptyField("term"))
        ));
        assert!(matches!(
            Flashcard::new("x", ""),
            Err(FlashcardError::EmptyField("definition"))
        ));
    }
}
