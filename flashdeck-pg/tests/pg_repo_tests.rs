//! Runs only when `FLASHDECK_TEST_DATABASE_URL` points at a scratch database.

use chrono::Utc;
use flashdeck_core::{
    CardQueries, CardUpdate, DeckQueries, NewCard, NewDeck, Repository, CARD_NOT_FOUND,
    DECK_NOT_FOUND,
};
use flashdeck_pg::PostgresRepo;
use std::sync::Arc;

async fn services() -> Option<(DeckQueries, CardQueries)> {
    let url = std::env::var("FLASHDECK_TEST_DATABASE_URL").ok()?;
    let repo: Arc<dyn Repository> = Arc::new(PostgresRepo::connect(&url).await.unwrap());
    Some((DeckQueries::new(repo.clone()), CardQueries::new(repo)))
}

fn fresh_user() -> String {
    format!("pg-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
async fn ownership_counts_and_cascade() {
    let Some((decks, cards)) = services().await else {
        return;
    };
    let user = fresh_user();

    let empty = decks.create_deck(NewDeck::new(&user, "Empty")).await.into_data().unwrap();
    let full = decks.create_deck(NewDeck::new(&user, "Full")).await.into_data().unwrap();
    let card = cards
        .create_card(NewCard::new(full.id, "hola", "hello"))
        .await
        .into_data()
        .unwrap();

    assert_eq!(
        decks.get_deck_by_id(full.id, "someone-else").await.error(),
        Some(DECK_NOT_FOUND)
    );

    let rows = decks.get_decks_with_card_counts(&user).await.into_data().unwrap();
    let counts: Vec<_> = rows.iter().map(|r| (r.deck.id, r.card_count)).collect();
    assert_eq!(counts, vec![(empty.id, 0), (full.id, 1)]);

    let updated = cards
        .update_card(CardUpdate::new(card.id, full.id).front("X"))
        .await
        .into_data()
        .unwrap();
    assert_eq!(updated.back, "hello");
    assert_eq!(updated.created_at, card.created_at);

    decks.delete_deck(full.id, &user).await.into_data().unwrap();
    assert!(cards.get_cards_by_deck_id(full.id).await.into_data().unwrap().is_empty());
    assert_eq!(cards.get_card_by_id(card.id).await.error(), Some(CARD_NOT_FOUND));

    decks.delete_deck(empty.id, &user).await.into_data().unwrap();
}

#[tokio::test]
async fn overlong_title_hits_generic_failure() {
    let Some((decks, _)) = services().await else {
        return;
    };
    let res = decks.create_deck(NewDeck::new(fresh_user(), "t".repeat(256))).await;
    assert_eq!(res.error(), Some("Failed to create deck"));
}
