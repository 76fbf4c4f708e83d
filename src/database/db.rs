//! Database operations for the flashcard review store
//!
//! Handles SQLite schema setup, CRUD for decks and flashcards,
//! and persistence of SM-2 review data. The store also keeps a simulated
//! "current date" so schedules can be stepped through day by day.

use crate::config::{MasteryThresholds, StoreConfig};
use crate::error::{FlashcardError, Result};
use crate::models::{Deck, DeckCard, DeckStats, Flashcard, Rating, ReviewData};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS decks (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS flashcards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deck_name TEXT NOT NULL,
    term TEXT NOT NULL,
    definition TEXT NOT NULL,
    FOREIGN KEY (deck_name) REFERENCES decks(name) ON DELETE CASCADE,
    UNIQUE(deck_name, term)
);

CREATE TABLE IF NOT EXISTS review_data (
    flashcard_id INTEGER PRIMARY KEY,
    easiness_factor REAL NOT NULL DEFAULT 2.5,
    interval_days INTEGER NOT NULL DEFAULT 0,
    repetitions INTEGER NOT NULL DEFAULT 0,
    next_review_date INTEGER NOT NULL,
    review_count INTEGER NOT NULL DEFAULT 0,
    correct_count INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at INTEGER,
    FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS app_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const CARD_COLUMNS: &str = "f.id, f.term, f.definition, r.easiness_factor, r.interval_days,
     r.repetitions, r.next_review_date, r.review_count, r.correct_count, r.last_reviewed_at";

/// SQLite-backed persistence for decks, cards and their review data.
pub struct ReviewStore {
    conn: Connection,
    initial_ease_factor: f64,
}

impl ReviewStore {
    /// Opens (or creates) the database file named in the config.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.database_path)?;
        info!("Opened review store at {}", config.database_path.display());
        Self::init(conn, config)
    }

    pub fn open_in_memory(config: &StoreConfig) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, config)
    }

    fn init(conn: Connection, config: &StoreConfig) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        // Initialize current_date if not exists
        conn.execute(
            "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
            params![Utc::now().timestamp().to_string()],
        )?;

        Ok(Self {
            conn,
            initial_ease_factor: config.initial_ease_factor,
        })
    }

    /// Current simulated date.
    pub fn current_date(&self) -> Result<DateTime<Utc>> {
        current_date(&self.conn)
    }

    pub fn set_current_date(&self, date: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
            params![date.timestamp().to_string()],
        )?;
        Ok(())
    }

    /// Advances the simulated date by one day and returns the new date.
    pub fn advance_day(&self) -> Result<DateTime<Utc>> {
        let next_day = self.current_date()? + Duration::days(1);
        self.set_current_date(next_day)?;
        info!("Current date advanced to {}", next_day.format("%Y-%m-%d"));
        Ok(next_day)
    }

    pub fn new_deck(&self, name: &str) -> Result<()> {
        let name = deck_key(name);
        if name.is_empty() {
            return Err(FlashcardError::EmptyField("deck name"));
        }
        if self.deck_exists(name)? {
            return Err(FlashcardError::DeckExists(name.to_string()));
        }
        self.conn
            .execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
        info!("Deck '{}' created", name);
        Ok(())
    }

    pub fn deck_exists(&self, name: &str) -> Result<bool> {
        let name = deck_key(name);
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM decks WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn deck_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM decks ORDER BY name")?;
        let decks = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(decks)
    }

    /// Deletes a deck together with its cards and their review data.
    pub fn delete_deck(&self, name: &str) -> Result<()> {
        let name = deck_key(name);
        let deleted = self
            .conn
            .execute("DELETE FROM decks WHERE name = ?1", params![name])?;
        if deleted == 0 {
            return Err(FlashcardError::DeckNotFound(name.to_string()));
        }
        info!("Deck '{}' deleted", name);
        Ok(())
    }

    /// Adds a flashcard to a deck and initializes its SM-2 review data.
    ///
    /// Returns the flashcard ID. A card with the same term in the same deck
    /// is left untouched and its existing ID is returned.
    pub fn add_flashcard(&self, deck_name: &str, term: &str, definition: &str) -> Result<i64> {
        let card = Flashcard::new(term, definition)?;
        self.insert_card(deck_name, &card)
    }

    fn insert_card(&self, deck_name: &str, card: &Flashcard) -> Result<i64> {
        let deck_name = self.require_deck(deck_name)?;

        self.conn.execute(
            "INSERT OR IGNORE INTO flashcards (deck_name, term, definition) VALUES (?1, ?2, ?3)",
            params![deck_name, card.term, card.definition],
        )?;

        let flashcard_id: i64 = self.conn.query_row(
            "SELECT id FROM flashcards WHERE deck_name = ?1 AND term = ?2",
            params![deck_name, card.term],
            |row| row.get(0),
        )?;

        let review = ReviewData::new(flashcard_id, self.current_date()?, self.initial_ease_factor);
        self.conn.execute(
            "INSERT OR IGNORE INTO review_data (flashcard_id, easiness_factor, interval_days,
                 repetitions, next_review_date, review_count, correct_count, last_reviewed_at)
             VALUES (?1, ?2, 0, 0, ?3, 0, 0, NULL)",
            params![
                flashcard_id,
                review.ease_factor,
                review.next_review.timestamp()
            ],
        )?;

        debug!("Flashcard {} '{}' in deck '{}'", flashcard_id, card.term, deck_name);
        Ok(flashcard_id)
    }

    /// Inserts a card with previously recorded review data (used by import).
    /// Review state the scheduler could not work with is rejected before
    /// anything is written.
    pub fn restore_card(&self, deck_name: &str, card: &Flashcard, review: &ReviewData) -> Result<i64> {
        review.validate()?;
        let id = self.insert_card(deck_name, card)?;
        let restored = ReviewData {
            flashcard_id: id,
            ..review.clone()
        };
        save_review_data(&self.conn, &restored)?;
        Ok(id)
    }

    pub fn delete_flashcard(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM flashcards WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(FlashcardError::CardNotFound(id));
        }
        debug!("Flashcard {} deleted", id);
        Ok(())
    }

    pub fn get_card(&self, id: i64) -> Result<DeckCard> {
        load_card(&self.conn, id)
    }

    /// Records a rating for a card at the current simulated date.
    ///
    /// Load, schedule and save happen in one IMMEDIATE transaction, so two
    /// ratings of the same card never interleave.
    pub fn rate_card(&mut self, id: i64, rating: Rating) -> Result<ReviewData> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let now = current_date(&tx)?;
        let mut review = load_card(&tx, id)?.review;
        review.apply_rating(rating, now);
        save_review_data(&tx, &review)?;

        tx.commit()?;

        debug!(
            "Card {} rated {}: ef={:.2} interval={}d reps={} next={}",
            id,
            rating,
            review.ease_factor,
            review.interval_days,
            review.repetitions,
            review.next_review.format("%Y-%m-%d")
        );
        Ok(review)
    }

    /// Retrieves flashcards due for review in a deck
    ///
    /// Returns cards where next_review_date <= current_date,
    /// ordered by next_review_date (oldest first).
    pub fn due_cards(&self, deck_name: &str) -> Result<Vec<DeckCard>> {
        let deck_name = self.require_deck(deck_name)?;
        let now = self.current_date()?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS}
             FROM flashcards f
             JOIN review_data r ON f.id = r.flashcard_id
             WHERE f.deck_name = ?1 AND r.next_review_date <= ?2
             ORDER BY r.next_review_date ASC, f.id ASC"
        ))?;

        let cards = stmt
            .query_map(params![deck_name, now.timestamp()], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Loads a deck with every card and its review data.
    pub fn load_deck(&self, deck_name: &str) -> Result<Deck> {
        let deck_name = self.require_deck(deck_name)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS}
             FROM flashcards f
             JOIN review_data r ON f.id = r.flashcard_id
             WHERE f.deck_name = ?1
             ORDER BY f.id ASC"
        ))?;

        let cards = stmt
            .query_map(params![deck_name], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Deck {
            name: deck_name.to_string(),
            cards,
        })
    }

    pub fn deck_stats(&self, deck_name: &str, thresholds: &MasteryThresholds) -> Result<DeckStats> {
        let deck = self.load_deck(deck_name)?;
        Ok(deck.stats(self.current_date()?, thresholds))
    }

    /// Resolves a user-supplied deck name to the stored one.
    fn require_deck<'a>(&self, name: &'a str) -> Result<&'a str> {
        let name = deck_key(name);
        if self.deck_exists(name)? {
            Ok(name)
        } else {
            Err(FlashcardError::DeckNotFound(name.to_string()))
        }
    }
}

/// Deck names are stored trimmed; every lookup goes through here.
fn deck_key(name: &str) -> &str {
    name.trim()
}

fn current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;

    let secs = value
        .parse::<i64>()
        .map_err(|_| FlashcardError::Config(format!("stored current_date '{value}' is not a timestamp")))?;
    timestamp_to_date(secs)
}

fn timestamp_to_date(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| FlashcardError::Config(format!("timestamp {secs} is out of range")))
}

fn load_card(conn: &Connection, id: i64) -> Result<DeckCard> {
    conn.query_row(
        &format!(
            "SELECT {CARD_COLUMNS}
             FROM flashcards f
             JOIN review_data r ON f.id = r.flashcard_id
             WHERE f.id = ?1"
        ),
        params![id],
        card_from_row,
    )
    .optional()?
    .ok_or(FlashcardError::CardNotFound(id))
}

fn save_review_data(conn: &Connection, review: &ReviewData) -> Result<()> {
    let updated = conn.execute(
        "UPDATE review_data
         SET easiness_factor = ?1, interval_days = ?2, repetitions = ?3, next_review_date = ?4,
             review_count = ?5, correct_count = ?6, last_reviewed_at = ?7
         WHERE flashcard_id = ?8",
        params![
            review.ease_factor,
            review.interval_days,
            review.repetitions,
            review.next_review.timestamp(),
            review.review_count,
            review.correct_count,
            review.last_reviewed_at.map(|t| t.timestamp()),
            review.flashcard_id
        ],
    )?;
    if updated == 0 {
        return Err(FlashcardError::CardNotFound(review.flashcard_id));
    }
    Ok(())
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<DeckCard> {
    let id: i64 = row.get(0)?;
    let next_review = row_timestamp(row, 6)?;
    let last_reviewed_at = match row.get::<_, Option<i64>>(9)? {
        Some(secs) => Some(datetime_from_column(9, secs)?),
        None => None,
    };

    Ok(DeckCard {
        id,
        flashcard: Flashcard {
            term: row.get(1)?,
            definition: row.get(2)?,
        },
        review: ReviewData {
            flashcard_id: id,
            ease_factor: row.get(3)?,
            interval_days: row.get(4)?,
            repetitions: row.get(5)?,
            next_review,
            review_count: row.get(7)?,
            correct_count: row.get(8)?,
            last_reviewed_at,
        },
    })
}

fn row_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    datetime_from_column(idx, secs)
}

fn datetime_from_column(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}
