use clap::{Parser, Subcommand};
use flashcards_srs::export::{export_deck, import_deck};
use flashcards_srs::*;
use log::error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "flashcards", about = "Spaced repetition flashcards (SM-2)")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overrides the config and FLASHCARDS_DB
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List decks
    Decks,
    /// Create a deck
    NewDeck { name: String },
    /// Delete a deck and all of its cards
    DeleteDeck { name: String },
    /// Add a card to a deck
    Add {
        deck: String,
        term: String,
        definition: String,
    },
    /// Delete a card
    Delete { id: i64 },
    /// Show one card with its schedule
    Show { id: i64 },
    /// List cards due for review
    Due { deck: String },
    /// Rate a card 0-5 (3 and above is a pass)
    Rate { id: i64, rating: Rating },
    /// Review all due cards of a deck, retrying failures
    Review { deck: String },
    /// Deck statistics
    Stats { deck: String },
    /// Move the simulated date forward
    AdvanceDay {
        #[arg(default_value_t = 1)]
        days: u32,
    },
    /// Export a deck with its schedule to JSON
    Export { deck: String, path: PathBuf },
    /// Import a deck from JSON
    Import { path: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            if err.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.store.database_path = db;
    }
    let mut store = ReviewStore::open(&config.store)?;

    match cli.command {
        Command::Decks => {
            for name in store.deck_names()? {
                let stats = store.deck_stats(&name, &config.mastery)?;
                println!("{name} ({} cards, {} due)", stats.total, stats.due);
            }
        }
        Command::NewDeck { name } => store.new_deck(&name)?,
        Command::DeleteDeck { name } => store.delete_deck(&name)?,
        Command::Add {
            deck,
            term,
            definition,
        } => {
            let id = store.add_flashcard(&deck, &term, &definition)?;
            println!("{id}");
        }
        Command::Delete { id } => store.delete_flashcard(id)?,
        Command::Show { id } => print_card(&store.get_card(id)?, &config.mastery),
        Command::Due { deck } => {
            for card in store.due_cards(&deck)? {
                println!("{:>5}  {}", card.id, card.flashcard.term);
            }
        }
        Command::Rate { id, rating } => {
            let review = store.rate_card(id, rating)?;
            print_review(&review);
        }
        Command::Review { deck } => review_deck(&mut store, &deck)?,
        Command::Stats { deck } => {
            let stats = store.deck_stats(&deck, &config.mastery)?;
            println!("Cards:     {}", stats.total);
            println!("Due:       {}", stats.due);
            println!("Reviewed:  {}", stats.reviewed);
            println!("Mastered:  {}", stats.mastered);
            println!("Avg. EF:   {:.2}", stats.average_ease_factor);
        }
        Command::AdvanceDay { days } => {
            for _ in 0..days {
                store.advance_day()?;
            }
            println!("Today is {}", store.current_date()?.format("%Y-%m-%d"));
        }
        Command::Export { deck, path } => {
            export_deck(&store, &deck, &path)?;
        }
        Command::Import { path } => {
            let count = import_deck(&store, &path)?;
            println!("Imported {count} cards");
        }
    }

    Ok(())
}

fn review_deck(store: &mut ReviewStore, deck: &str) -> Result<()> {
    let mut session = LearningSession::new_from_due_cards(store, deck)?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_completed() {
        let Some(card) = session.current_card() else {
            break;
        };
        let term = card.card.flashcard.term.clone();
        let definition = card.card.flashcard.definition.clone();
        let seen = card.review().review_count;

        println!("\n{}", session.phase_message());
        if seen == 0 {
            println!("{term}  (new)");
        } else {
            println!("{term}  (seen {seen} times)");
        }
        prompt("Press Enter to reveal")?;
        if lines.next().transpose()?.is_none() {
            return Ok(());
        }
        session.toggle_definition();
        println!("{definition}");

        let rating = loop {
            prompt("Rating (0-5)")?;
            let Some(line) = lines.next().transpose()? else {
                return Ok(());
            };
            match line.parse::<Rating>() {
                Ok(rating) => break rating,
                Err(err) => println!("{err}"),
            }
        };

        if let Some(review) = session.grade_current_card(store, rating)? {
            print_review(&review);
        }
        session.next_card();
    }

    println!("\nNothing left to review in '{deck}'");
    Ok(())
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}: ");
    io::stdout().flush()?;
    Ok(())
}

fn print_review(review: &ReviewData) {
    println!(
        "ease {:.2}, interval {} day(s), repetitions {}, next review {}",
        review.ease_factor,
        review.interval_days,
        review.repetitions,
        review.next_review.format("%Y-%m-%d")
    );
}

fn print_card(card: &DeckCard, mastery: &MasteryThresholds) {
    let review = &card.review;
    println!("{} -> {}", card.flashcard.term, card.flashcard.definition);
    print_review(review);
    println!(
        "reviews {}, correct {} ({:.0}%), mastered: {}",
        review.review_count,
        review.correct_count,
        review.accuracy() * 100.0,
        if review.is_mastered(mastery) { "yes" } else { "no" }
    );
    if let Some(last) = review.last_reviewed_at {
        println!("last reviewed {}", last.format("%Y-%m-%d"));
    }
}
