pub mod json;

pub use json::{CardSnapshot, DeckSnapshot, export_deck, import_deck};
