use flashdeck_core::{
    memory::MemoryRepo, validate_title, CardQueries, CardUpdate, CoreError, DeckQueries,
    DeckUpdate, NewCard, NewDeck, Repository, CARD_NOT_FOUND, DECK_NOT_FOUND,
};
use std::sync::Arc;

fn services() -> (DeckQueries, CardQueries) {
    let repo: Arc<dyn Repository> = Arc::new(MemoryRepo::new());
    (DeckQueries::new(repo.clone()), CardQueries::new(repo))
}

#[tokio::test]
async fn create_then_get_deck_round_trips() {
    let (decks, _) = services();
    let created = decks
        .create_deck(NewDeck::new("u1", "Spanish").with_description("Basics"))
        .await
        .into_data()
        .unwrap();

    let fetched = decks.get_deck_by_id(created.id, "u1").await;
    assert_eq!(fetched.error(), None);
    assert_eq!(fetched.data(), Some(&created));
    assert_eq!(created.created_at, created.updated_at);
}

#[tokio::test]
async fn other_users_cannot_see_or_touch_a_deck() {
    let (decks, _) = services();
    let deck = decks
        .create_deck(NewDeck::new("u1", "Private"))
        .await
        .into_data()
        .unwrap();

    let got = decks.get_deck_by_id(deck.id, "u2").await;
    assert_eq!(got.error(), Some(DECK_NOT_FOUND));
    assert!(got.data().is_none());

    let upd = decks
        .update_deck(DeckUpdate::new(deck.id, "u2").title("Stolen"))
        .await;
    assert_eq!(upd.error(), Some(DECK_NOT_FOUND));

    let del = decks.delete_deck(deck.id, "u2").await;
    assert_eq!(del.error(), Some(DECK_NOT_FOUND));

    assert!(decks.get_decks_by_user_id("u2").await.into_data().unwrap().is_empty());
    let still = decks.get_deck_by_id(deck.id, "u1").await.into_data().unwrap();
    assert_eq!(still.title, "Private");
}

#[tokio::test]
async fn card_counts_include_empty_decks() {
    let (decks, cards) = services();
    let empty = decks.create_deck(NewDeck::new("u1", "Empty")).await.into_data().unwrap();
    let full = decks.create_deck(NewDeck::new("u1", "Full")).await.into_data().unwrap();
    decks.create_deck(NewDeck::new("u2", "Elsewhere")).await;
    for i in 0..3 {
        let c = cards
            .create_card(NewCard::new(full.id, format!("q{i}"), format!("a{i}")))
            .await;
        assert!(c.is_ok());
    }

    let rows = decks.get_decks_with_card_counts("u1").await.into_data().unwrap();
    assert_eq!(rows.len(), 2);
    let count_of = |id| rows.iter().find(|r| r.deck.id == id).map(|r| r.card_count);
    assert_eq!(count_of(empty.id), Some(0));
    assert_eq!(count_of(full.id), Some(3));
}

#[tokio::test]
async fn card_counts_follow_update_order() {
    let (decks, _) = services();
    let first = decks.create_deck(NewDeck::new("u1", "First")).await.into_data().unwrap();
    let second = decks.create_deck(NewDeck::new("u1", "Second")).await.into_data().unwrap();

    // Touching the first deck moves it behind the second.
    decks
        .update_deck(DeckUpdate::new(first.id, "u1").title("First, renamed"))
        .await
        .into_data()
        .unwrap();

    let rows = decks.get_decks_with_card_counts("u1").await.into_data().unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.deck.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn deleting_a_deck_cascades_to_cards() {
    let (decks, cards) = services();
    let deck = decks.create_deck(NewDeck::new("u1", "Doomed")).await.into_data().unwrap();
    let card = cards
        .create_card(NewCard::new(deck.id, "front", "back"))
        .await
        .into_data()
        .unwrap();

    let removed = decks.delete_deck(deck.id, "u1").await.into_data().unwrap();
    assert_eq!(removed, deck);

    let left = cards.get_cards_by_deck_id(deck.id).await;
    assert_eq!(left.error(), None);
    assert!(left.into_data().unwrap().is_empty());
    assert_eq!(cards.get_card_by_id(card.id).await.error(), Some(CARD_NOT_FOUND));
}

#[tokio::test]
async fn update_card_changes_only_supplied_side() {
    let (decks, cards) = services();
    let deck = decks.create_deck(NewDeck::new("u1", "Lang")).await.into_data().unwrap();
    let card = cards
        .create_card(NewCard::new(deck.id, "hola", "hello"))
        .await
        .into_data()
        .unwrap();

    let updated = cards
        .update_card(CardUpdate::new(card.id, deck.id).front("X"))
        .await
        .into_data()
        .unwrap();

    assert_eq!(updated.front, "X");
    assert_eq!(updated.back, card.back);
    assert_eq!(updated.created_at, card.created_at);
    assert!(updated.updated_at >= card.updated_at);
}

#[tokio::test]
async fn update_card_moves_card_to_supplied_deck() {
    let (decks, cards) = services();
    let a = decks.create_deck(NewDeck::new("u1", "A")).await.into_data().unwrap();
    let b = decks.create_deck(NewDeck::new("u1", "B")).await.into_data().unwrap();
    let card = cards.create_card(NewCard::new(a.id, "f", "b")).await.into_data().unwrap();

    let moved = cards
        .update_card(CardUpdate::new(card.id, b.id).back("moved"))
        .await
        .into_data()
        .unwrap();
    assert_eq!(moved.deck_id, b.id);
    assert_eq!(moved.front, "f");
    assert_eq!(moved.back, "moved");

    assert!(cards.get_cards_by_deck_id(a.id).await.into_data().unwrap().is_empty());
    let in_b = cards.get_cards_by_deck_id(b.id).await.into_data().unwrap();
    assert_eq!(in_b, vec![moved]);
}

#[tokio::test]
async fn update_card_into_missing_deck_fails() {
    let (decks, cards) = services();
    let deck = decks.create_deck(NewDeck::new("u1", "A")).await.into_data().unwrap();
    let card = cards.create_card(NewCard::new(deck.id, "f", "b")).await.into_data().unwrap();

    let res = cards.update_card(CardUpdate::new(card.id, 999).front("x")).await;
    assert_eq!(res.error(), Some("Failed to update card"));

    let same = cards.get_card_by_id(card.id).await.into_data().unwrap();
    assert_eq!(same, card);
}

#[tokio::test]
async fn deck_scoped_card_mutations_skip_other_decks() {
    let (decks, cards) = services();
    let a = decks.create_deck(NewDeck::new("u1", "A")).await.into_data().unwrap();
    let b = decks.create_deck(NewDeck::new("u2", "B")).await.into_data().unwrap();
    let card = cards.create_card(NewCard::new(a.id, "f", "b")).await.into_data().unwrap();

    let upd = cards
        .update_card_in_deck(CardUpdate::new(card.id, b.id).front("taken"))
        .await;
    assert_eq!(upd.error(), Some(CARD_NOT_FOUND));
    let del = cards.delete_card_in_deck(card.id, b.id).await;
    assert_eq!(del.error(), Some(CARD_NOT_FOUND));
    assert_eq!(cards.get_card_by_id(card.id).await.into_data().unwrap(), card);

    let upd = cards
        .update_card_in_deck(CardUpdate::new(card.id, a.id).front("kept"))
        .await
        .into_data()
        .unwrap();
    assert_eq!((upd.deck_id, upd.front.as_str()), (a.id, "kept"));
    let del = cards.delete_card_in_deck(card.id, a.id).await.into_data().unwrap();
    assert_eq!(del.id, card.id);
    assert_eq!(cards.get_card_by_id(card.id).await.error(), Some(CARD_NOT_FOUND));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cards_added_while_deck_is_deleted_never_outlive_it() {
    let (decks, cards) = services();
    for round in 0..50 {
        let deck_id = decks
            .create_deck(NewDeck::new("u1", format!("round {round}")))
            .await
            .into_data()
            .unwrap()
            .id;

        let mut adds = Vec::new();
        for i in 0..8 {
            let cards = cards.clone();
            adds.push(tokio::spawn(async move {
                cards.create_card(NewCard::new(deck_id, format!("q{i}"), "a")).await
            }));
        }
        let decks_for_delete = decks.clone();
        let delete =
            tokio::spawn(async move { decks_for_delete.delete_deck(deck_id, "u1").await });

        assert!(delete.await.unwrap().is_ok());
        for add in adds {
            if let Some(card) = add.await.unwrap().into_data() {
                assert_eq!(cards.get_card_by_id(card.id).await.error(), Some(CARD_NOT_FOUND));
            }
        }
        assert!(cards.get_cards_by_deck_id(deck_id).await.into_data().unwrap().is_empty());
    }
}

#[tokio::test]
async fn deleting_missing_rows_reports_not_found() {
    let (decks, cards) = services();

    let d = decks.delete_deck(42, "u1").await;
    assert_eq!(d.error(), Some(DECK_NOT_FOUND));
    assert!(d.data().is_none());

    let c = cards.delete_card(42).await;
    assert_eq!(c.error(), Some(CARD_NOT_FOUND));
    assert!(c.data().is_none());

    let u = cards.update_card(CardUpdate::new(42, 1).front("x")).await;
    assert_eq!(u.error(), Some(CARD_NOT_FOUND));
}

#[tokio::test]
async fn card_for_missing_deck_fails_to_create() {
    let (_, cards) = services();
    let res = cards.create_card(NewCard::new(99, "f", "b")).await;
    assert_eq!(res.error(), Some("Failed to create card"));
}

#[tokio::test]
async fn overlong_title_is_rejected() {
    let (decks, _) = services();
    let res = decks.create_deck(NewDeck::new("u1", "x".repeat(256))).await;
    assert_eq!(res.error(), Some("Failed to create deck"));

    let ok = decks.create_deck(NewDeck::new("u1", "x".repeat(255))).await;
    assert!(ok.is_ok());

    let deck = ok.into_data().unwrap();
    let res = decks
        .update_deck(DeckUpdate::new(deck.id, "u1").title("y".repeat(300)))
        .await;
    assert_eq!(res.error(), Some("Failed to update deck"));
}

#[tokio::test]
async fn title_limit_counts_utf16_units() {
    let (decks, _) = services();
    // Each emoji is a surrogate pair: 127 of them are 254 units, 128 are 256.
    let fits = decks.create_deck(NewDeck::new("u1", "😀".repeat(127))).await;
    assert!(fits.is_ok());

    let over = decks.create_deck(NewDeck::new("u1", "😀".repeat(128))).await;
    assert_eq!(over.error(), Some("Failed to create deck"));

    let err = validate_title(&"😀".repeat(128)).unwrap_err();
    assert!(matches!(err, CoreError::Invalid(msg) if msg.contains("UTF-16")));
}

#[tokio::test]
async fn update_deck_can_clear_description() {
    let (decks, _) = services();
    let deck = decks
        .create_deck(NewDeck::new("u1", "Notes").with_description("old"))
        .await
        .into_data()
        .unwrap();

    let kept = decks
        .update_deck(DeckUpdate::new(deck.id, "u1").title("Renamed"))
        .await
        .into_data()
        .unwrap();
    assert_eq!(kept.description.as_deref(), Some("old"));

    let cleared = decks
        .update_deck(DeckUpdate::new(deck.id, "u1").description(None))
        .await
        .into_data()
        .unwrap();
    assert_eq!(cleared.title, "Renamed");
    assert_eq!(cleared.description, None);
}

#[tokio::test]
async fn spanish_walkthrough() {
    let (decks, cards) = services();
    let deck = decks.create_deck(NewDeck::new("u1", "Spanish")).await.into_data().unwrap();
    assert_eq!(deck.id, 1);
    let card = cards
        .create_card(NewCard::new(deck.id, "hola", "hello"))
        .await
        .into_data()
        .unwrap();
    assert_eq!(card.id, 1);

    let rows = decks.get_decks_with_card_counts("u1").await.into_data().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].deck.title, "Spanish");
    assert_eq!(rows[0].card_count, 1);

    assert_eq!(decks.delete_deck(1, "u1").await.into_data().unwrap().id, 1);
    let gone = cards.get_card_by_id(1).await;
    assert!(gone.data().is_none());
    assert_eq!(gone.error(), Some("Card not found"));
}
