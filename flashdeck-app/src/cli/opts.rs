use clap::{Args, Parser, Subcommand, ValueEnum};
use flashdeck_core::{CardId, DeckId};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Sqlite,
    Postgres,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "flashdeck", version, about = "Flashdeck deck and card store")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, env = "FLASHDECK_STORE", default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// SQLite DB path when --store sqlite (defaults to app data dir)
    #[arg(long, env = "FLASHDECK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// PostgreSQL connection string when --store postgres
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Authenticated user id; every deck operation is scoped to it
    #[arg(long, env = "FLASHDECK_USER")]
    pub user: String,

    /// Print raw `{data, error}` envelopes as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Decks with card counts, least recently updated first
    List,
    /// One deck and its cards
    Show { id: DeckId },
    Edit(DeckEdit),
    Rm { id: DeckId },
}

#[derive(Debug, Args, Clone)]
pub struct DeckEdit {
    pub id: DeckId,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        deck: DeckId,
    },
    Show {
        id: CardId,
        #[arg(long)]
        deck: DeckId,
    },
    Edit(CardEdit),
    Rm {
        id: CardId,
        #[arg(long)]
        deck: DeckId,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub deck: DeckId,
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub id: CardId,
    #[arg(long)]
    pub deck: DeckId,
    #[arg(long)]
    pub front: Option<String>,
    #[arg(long)]
    pub back: Option<String>,
}
