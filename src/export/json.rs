//! JSON import/export of deck snapshots.
//! A snapshot carries every card of a deck together with its review state,
//! so a deck moved between databases keeps its schedule.

use crate::database::ReviewStore;
use crate::error::Result;
use crate::models::{Deck, Flashcard, ReviewData};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub name: String,
    pub exported_at: DateTime<Utc>,
    pub cards: Vec<CardSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardSnapshot {
    pub term: String,
    pub definition: String,
    /// Missing in hand-written files; the card then starts fresh.
    #[serde(default)]
    pub review: Option<ReviewData>,
}

impl DeckSnapshot {
    pub fn from_deck(deck: &Deck, exported_at: DateTime<Utc>) -> Self {
        Self {
            name: deck.name.clone(),
            exported_at,
            cards: deck
                .cards
                .iter()
                .map(|card| CardSnapshot {
                    term: card.flashcard.term.clone(),
                    definition: card.flashcard.definition.clone(),
                    review: Some(card.review.clone()),
                })
                .collect(),
        }
    }
}

pub fn write_snapshot(snapshot: &DeckSnapshot, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<DeckSnapshot> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Exports a deck and its review state to a JSON file.
pub fn export_deck(store: &ReviewStore, deck_name: &str, path: &Path) -> Result<DeckSnapshot> {
    let deck = store.load_deck(deck_name)?;
    let snapshot = DeckSnapshot::from_deck(&deck, store.current_date()?);
    write_snapshot(&snapshot, path)?;
    info!(
        "Deck '{}' exported to '{}' ({} cards)",
        deck_name,
        path.display(),
        snapshot.cards.len()
    );
    Ok(snapshot)
}

/// Imports a deck snapshot, creating the deck if needed.
/// Cards with blank fields or review state the scheduler cannot use are
/// skipped. Returns the number of cards imported.
pub fn import_deck(store: &ReviewStore, path: &Path) -> Result<usize> {
    let snapshot = read_snapshot(path)?;

    if !store.deck_exists(&snapshot.name)? {
        store.new_deck(&snapshot.name)?;
    }

    let mut imported = 0;
    for card in &snapshot.cards {
        let flashcard = match Flashcard::new(&card.term, &card.definition) {
            Ok(flashcard) => flashcard,
            Err(err) => {
                warn!("Skipping card '{}' in '{}': {}", card.term, snapshot.name, err);
                continue;
            }
        };

        match &card.review {
            Some(review) => {
                if let Err(err) = review.validate() {
                    warn!("Skipping card '{}' in '{}': {}", card.term, snapshot.name, err);
                    continue;
                }
                store.restore_card(&snapshot.name, &flashcard, review)?
            }
            None => store.add_flashcard(&snapshot.name, &flashcard.term, &flashcard.definition)?,
        };
        imported += 1;
    }

    info!(
        "Deck '{}' imported from '{}' ({} cards)",
        snapshot.name,
        path.display(),
        imported
    );
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::FlashcardError;
    use crate::models::Rating;
    use std::fs;

    fn store_with_deck() -> ReviewStore {
        let store = ReviewStore::open_in_memory(&StoreConfig::default()).unwrap();
        store.new_deck("Test Deck").unwrap();
        store.add_flashcard("Test Deck", "hello", "cześć").unwrap();
        store.add_flashcard("Test Deck", "goodbye", "do widzenia").unwrap();
        store
    }

    #[test]
    fn test_export_keeps_review_state() {
        let mut store = store_with_deck();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");

        let hello = store.load_deck("Test Deck").unwrap().cards[0].id;
        store.rate_card(hello, Rating::new(5).unwrap()).unwrap();

        export_deck(&store, "Test Deck", &path).unwrap();

        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.name, "Test Deck");
        assert_eq!(snapshot.cards.len(), 2);
        let review = snapshot.cards[0].review.as_ref().unwrap();
        assert_eq!(review.interval_days, 1);
        assert_eq!(review.review_count, 1);
    }

    #[test]
    fn test_import_into_fresh_store() {
        let mut source = store_with_deck();
        let hello = source.load_deck("Test Deck").unwrap().cards[0].id;
        source.rate_card(hello, Rating::new(5).unwrap()).unwrap();
        source.rate_card(hello, Rating::new(5).unwrap()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        export_deck(&source, "Test Deck", &path).unwrap();

        let target = ReviewStore::open_in_memory(&StoreConfig::default()).unwrap();
        assert_eq!(import_deck(&target, &path).unwrap(), 2);

        let deck = target.load_deck("Test Deck").unwrap();
        let card = deck
            .cards
            .iter()
            .find(|c| c.flashcard.term == "hello")
            .unwrap();
        assert_eq!(card.review.interval_days, 6);
        assert_eq!(card.review.repetitions, 2);
        assert_eq!(card.review.flashcard_id, card.id);
    }

    #[test]
    fn test_import_hand_written_file() {
        let json_content = r#"{
  "name": "Import Test Deck",
  "exported_at": "2025-01-01T00:00:00Z",
  "cards": [
    { "term": "test term", "definition": "test definition" },
    { "term": "   ", "definition": "blank term" }
  ]
}"#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let store = ReviewStore::open_in_memory(&StoreConfig::default()).unwrap();
        assert_eq!(import_deck(&store, &path).unwrap(), 1);

        let deck = store.load_deck("Import Test Deck").unwrap();
        assert_eq!(deck.cards[0].flashcard.term, "test term");
        assert_eq!(deck.cards[0].review.repetitions, 0);
    }

    #[test]
    fn test_import_skips_unschedulable_review_state() {
        let json_content = r#"{
  "name": "Broken Deck",
  "exported_at": "2025-01-01T00:00:00Z",
  "cards": [
    {
      "term": "entropy",
      "definition": "disorder",
      "review": {
        "flashcard_id": 1,
        "ease_factor": 0.2,
        "interval_days": 4000000000,
        "repetitions": 9,
        "next_review": "2025-01-02T00:00:00Z",
        "review_count": 9,
        "correct_count": 9,
        "last_reviewed_at": null
      }
    },
    {
      "term": "enthalpy",
      "definition": "heat content",
      "review": {
        "flashcard_id": 2,
        "ease_factor": 2.2,
        "interval_days": 12,
        "repetitions": 3,
        "next_review": "2025-01-13T00:00:00Z",
        "review_count": 4,
        "correct_count": 3,
        "last_reviewed_at": "2025-01-01T00:00:00Z"
      }
    }
  ]
}"#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, json_content).unwrap();

        let mut store = ReviewStore::open_in_memory(&StoreConfig::default()).unwrap();
        assert_eq!(import_deck(&store, &path).unwrap(), 1);

        let deck = store.load_deck("Broken Deck").unwrap();
        assert_eq!(deck.len(), 1);
        let card = &deck.cards[0];
        assert_eq!(card.flashcard.term, "enthalpy");
        assert_eq!(card.review.interval_days, 12);
        assert!((card.review.ease_factor - 2.2).abs() < 1e-9);

        // the surviving card is still rateable
        let review = store.rate_card(card.id, Rating::new(5).unwrap()).unwrap();
        assert_eq!(review.interval_days, 26);
    }

    #[test]
    fn test_restore_rejects_low_ease_factor() {
        let store = ReviewStore::open_in_memory(&StoreConfig::default()).unwrap();
        store.new_deck("Chem").unwrap();
        let flashcard = Flashcard::new("mole", "6.022e23").unwrap();
        let mut review = ReviewData::new(0, Utc::now(), 2.5);
        review.ease_factor = 0.2;

        let result = store.restore_card("Chem", &flashcard, &review);
        assert!(matches!(
            result,
            Err(FlashcardError::InvalidReviewState { .. })
        ));
        assert!(store.load_deck("Chem").unwrap().is_empty());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let store = ReviewStore::open_in_memory(&StoreConfig::default()).unwrap();
        let result = import_deck(&store, Path::new("nonexistent_file_xyz123.json"));
        assert!(matches!(result, Err(FlashcardError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let result = read_snapshot(&path);
        assert!(matches!(result, Err(FlashcardError::Json(_))));
    }
}
