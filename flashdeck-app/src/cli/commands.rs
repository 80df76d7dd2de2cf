use crate::cli::opts::*;
use crate::display::{card_count_label, format_updated};
use crate::paths::data_root;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use flashdeck_core::{
    Card, CardId, CardQueries, CardUpdate, Deck, DeckId, DeckQueries, DeckUpdate, NewCard, NewDeck,
    QueryResult, Repository, CARD_NOT_FOUND,
};
use flashdeck_pg::PostgresRepo;
use flashdeck_sqlite::SqliteRepo;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

struct Ctx {
    decks: DeckQueries,
    cards: CardQueries,
    user: String,
    json: bool,
}

pub async fn run_cli(args: Cli) -> Result<()> {
    let repo = open_repo(&args).await?;
    let ctx = Ctx {
        decks: DeckQueries::new(repo.clone()),
        cards: CardQueries::new(repo),
        user: args.user,
        json: args.json,
    };
    match args.cmd {
        Command::Deck(cmd) => deck_cmd(&ctx, cmd).await,
        Command::Card(cmd) => card_cmd(&ctx, cmd).await,
    }
}

pub async fn open_repo(args: &Cli) -> Result<Arc<dyn Repository>> {
    debug!(store = ?args.store, "opening store");
    match args.store {
        StoreKind::Sqlite => {
            let p = args
                .db_path
                .clone()
                .unwrap_or_else(|| data_root().join("flashdeck.sqlite3"));
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let s = SqliteRepo::open_file(&p).await?;
            Ok(Arc::new(s))
        }
        StoreKind::Postgres => {
            let url = args
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow!("--store postgres needs --database-url or DATABASE_URL"))?;
            let s = PostgresRepo::connect(url).await?;
            Ok(Arc::new(s))
        }
    }
}

/// Prints the envelope (as JSON or through `render`) and turns an error
/// branch into a failing exit.
fn emit<T: Serialize>(json: bool, r: QueryResult<T>, render: impl FnOnce(T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
    }
    match r.into_result() {
        Ok(data) => {
            if !json {
                render(data);
            }
            Ok(())
        }
        Err(msg) => bail!(msg),
    }
}

async fn deck_cmd(ctx: &Ctx, cmd: DeckCmd) -> Result<()> {
    match cmd {
        DeckCmd::Add { title, description } => {
            let input = NewDeck {
                user_id: ctx.user.clone(),
                title,
                description,
            };
            let r = ctx.decks.create_deck(input).await;
            emit(ctx.json, r, |d| println!("{}", d.id))
        }
        DeckCmd::List => {
            let r = ctx.decks.get_decks_with_card_counts(&ctx.user).await;
            emit(ctx.json, r, |rows| {
                if rows.is_empty() {
                    println!("No decks yet. Create your first deck with `flashdeck deck add <title>`.");
                    return;
                }
                let now = Utc::now();
                for row in rows {
                    println!(
                        "{}\t{}\t{}\tupdated {}",
                        row.deck.id,
                        row.deck.title,
                        card_count_label(row.card_count),
                        format_updated(row.deck.updated_at, now)
                    );
                }
            })
        }
        DeckCmd::Show { id } => show_deck(ctx, id).await,
        DeckCmd::Edit(e) => {
            let mut update = DeckUpdate::new(e.id, ctx.user.clone());
            update.title = e.title;
            if e.clear_description {
                update.description = Some(None);
            } else if let Some(d) = e.description {
                update.description = Some(Some(d));
            }
            let r = ctx.decks.update_deck(update).await;
            emit(ctx.json, r, |d| println!("{}\t{}", d.id, d.title))
        }
        DeckCmd::Rm { id } => {
            let r = ctx.decks.delete_deck(id, &ctx.user).await;
            emit(ctx.json, r, |_| println!("ok"))
        }
    }
}

async fn show_deck(ctx: &Ctx, id: DeckId) -> Result<()> {
    let deck = owned_deck(ctx, id).await?;
    let cards = ctx.cards.get_cards_by_deck_id(id).await;
    if ctx.json {
        let both = serde_json::json!({ "deck": QueryResult::ok(&deck), "cards": &cards });
        println!("{}", serde_json::to_string_pretty(&both)?);
    }
    let cards = cards.into_result().map_err(|e| anyhow!(e))?;
    if ctx.json {
        return Ok(());
    }

    println!("{}", deck.title);
    if let Some(desc) = &deck.description {
        println!("{desc}");
    }
    println!();
    println!("Cards ({})", cards.len());
    if cards.is_empty() {
        println!("No cards yet");
    }
    for (i, c) in cards.iter().enumerate() {
        println!("#{}\t[{}]\t{}\t{}", i + 1, c.id, c.front, c.back);
    }
    Ok(())
}

/// Unwraps the data branch; in JSON mode an error envelope is printed first.
fn require<T: Serialize>(json: bool, r: QueryResult<T>) -> Result<T> {
    if json && r.is_err() {
        println!("{}", serde_json::to_string_pretty(&r)?);
    }
    r.into_result().map_err(|e| anyhow!(e))
}

/// Card commands act inside a deck, so the deck's ownership is checked
/// first, the same way the deck page does before listing its cards.
async fn owned_deck(ctx: &Ctx, deck_id: DeckId) -> Result<Deck> {
    require(ctx.json, ctx.decks.get_deck_by_id(deck_id, &ctx.user).await)
}

/// Read-only lookup; `edit` and `rm` scope their statement by deck instead.
async fn card_in_deck(ctx: &Ctx, id: CardId, deck: &Deck) -> Result<Card> {
    let r = match ctx.cards.get_card_by_id(id).await {
        QueryResult::Ok(c) if c.deck_id != deck.id => QueryResult::err(CARD_NOT_FOUND),
        other => other,
    };
    require(ctx.json, r)
}

async fn card_cmd(ctx: &Ctx, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let deck = owned_deck(ctx, a.deck).await?;
            let r = ctx.cards.create_card(NewCard::new(deck.id, a.front, a.back)).await;
            emit(ctx.json, r, |c| println!("{}", c.id))
        }
        CardCmd::List { deck } => {
            let deck = owned_deck(ctx, deck).await?;
            let r = ctx.cards.get_cards_by_deck_id(deck.id).await;
            emit(ctx.json, r, |cards| {
                for c in cards {
                    println!("{}\t{}\t{}", c.id, c.front, c.back);
                }
            })
        }
        CardCmd::Show { id, deck } => {
            let deck = owned_deck(ctx, deck).await?;
            let card = card_in_deck(ctx, id, &deck).await?;
            emit(ctx.json, QueryResult::ok(card), |c| {
                println!("Front: {}", c.front);
                println!("Back:  {}", c.back);
            })
        }
        CardCmd::Edit(e) => {
            let deck = owned_deck(ctx, e.deck).await?;
            let update = CardUpdate {
                id: e.id,
                deck_id: deck.id,
                front: e.front,
                back: e.back,
            };
            let r = ctx.cards.update_card_in_deck(update).await;
            emit(ctx.json, r, |c| println!("{}\t{}\t{}", c.id, c.front, c.back))
        }
        CardCmd::Rm { id, deck } => {
            let deck = owned_deck(ctx, deck).await?;
            let r = ctx.cards.delete_card_in_deck(id, deck.id).await;
            emit(ctx.json, r, |_| println!("ok"))
        }
    }
}
