//! Runtime configuration.
//!
//! Values come from an optional TOML file, then environment overrides:
//!
//! ```toml
//! [store]
//! database_path = "db.sqlite3"
//! initial_ease_factor = 2.5
//!
//! [mastery]
//! min_ease_factor = 2.5
//! min_interval_days = 21
//! ```

use crate::error::{FlashcardError, Result};
use crate::models::sm2::{DEFAULT_EASE_FACTOR, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATABASE_ENV: &str = "FLASHCARDS_DB";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub mastery: MasteryThresholds,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    /// Ease factor given to newly added cards.
    pub initial_ease_factor: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            initial_ease_factor: DEFAULT_EASE_FACTOR,
        }
    }
}

/// A card counts as mastered once both thresholds are reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasteryThresholds {
    pub min_ease_factor: f64,
    pub min_interval_days: u32,
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self {
            min_ease_factor: 2.5,
            min_interval_days: 21,
        }
    }
}

impl Config {
    /// Loads the config file if given, then applies `FLASHCARDS_DB`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };

        if let Ok(db) = std::env::var(DATABASE_ENV) {
            if !db.trim().is_empty() {
                config.store.database_path = PathBuf::from(db);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let initial = self.store.initial_ease_factor;
        if !initial.is_finite() || initial < MIN_EASE_FACTOR {
            return Err(FlashcardError::Config(format!(
                "initial_ease_factor must be a finite number of at least {MIN_EASE_FACTOR}, got {initial}"
            )));
        }
        if !self.mastery.min_ease_factor.is_finite() {
            return Err(FlashcardError::Config(
                "mastery.min_ease_factor must be a finite number".to_string(),
            ));
        }
        // Intervals never grow past the cap, so a higher threshold is unreachable
        if self.mastery.min_interval_days > MAX_INTERVAL_DAYS {
            return Err(FlashcardError::Config(format!(
                "mastery.min_interval_days must be at most {MAX_INTERVAL_DAYS}, got {}",
                self.mastery.min_interval_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.database_path, PathBuf::from("db.sqlite3"));
        assert_eq!(config.store.initial_ease_factor, 2.5);
        assert_eq!(config.mastery.min_interval_days, 21);
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
[store]
database_path = "/tmp/cards.sqlite3"

[mastery]
min_interval_days = 30
"#,
        )
        .unwrap();

        assert_eq!(
            config.store.database_path,
            PathBuf::from("/tmp/cards.sqlite3")
        );
        assert_eq!(config.store.initial_ease_factor, 2.5);
        assert_eq!(config.mastery.min_interval_days, 30);
        assert_eq!(config.mastery.min_ease_factor, 2.5);
    }

    #[test]
    fn test_rejects_low_initial_ease_factor() {
        let result = Config::from_toml("[store]\ninitial_ease_factor = 1.0\n");
        assert!(matches!(result, Err(FlashcardError::Config(_))));
    }

    #[test]
    fn test_rejects_infinite_initial_ease_factor() {
        let result = Config::from_toml("[store]\ninitial_ease_factor = inf\n");
        assert!(matches!(result, Err(FlashcardError::Config(_))));

        let result = Config::from_toml("[store]\ninitial_ease_factor = nan\n");
        assert!(matches!(result, Err(FlashcardError::Config(_))));
    }

    #[test]
    fn test_rejects_unreachable_mastery_interval() {
        let result = Config::from_toml("[mastery]\nmin_interval_days = 40000\n");
        assert!(matches!(result, Err(FlashcardError::Config(_))));
        assert!(Config::from_toml("[mastery]\nmin_interval_days = 36500\n").is_ok());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(Config::from_toml("[store\n").is_err());
    }
}
