use super::{settle, Outcome, CARD_NOT_FOUND};
use crate::{Card, CardId, CardUpdate, DeckId, NewCard, QueryResult, Repository};
use std::sync::Arc;

const UPDATE_CARD: Outcome = Outcome {
    op: "update_card",
    not_found: CARD_NOT_FOUND,
    failed: "Failed to update card",
};

const DELETE_CARD: Outcome = Outcome {
    op: "delete_card",
    not_found: CARD_NOT_FOUND,
    failed: "Failed to delete card",
};

#[derive(Clone)]
pub struct CardQueries {
    repo: Arc<dyn Repository>,
}

impl CardQueries {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn get_cards_by_deck_id(&self, deck_id: DeckId) -> QueryResult<Vec<Card>> {
        settle(
            self.repo.list_cards(deck_id).await,
            Outcome {
                op: "get_cards_by_deck_id",
                not_found: CARD_NOT_FOUND,
                failed: "Failed to get cards",
            },
        )
    }

    pub async fn get_card_by_id(&self, id: CardId) -> QueryResult<Card> {
        settle(
            self.repo.get_card(id).await,
            Outcome {
                op: "get_card_by_id",
                not_found: CARD_NOT_FOUND,
                failed: "Failed to get card",
            },
        )
    }

    pub async fn create_card(&self, input: NewCard) -> QueryResult<Card> {
        settle(
            self.repo.create_card(&input).await,
            Outcome {
                op: "create_card",
                not_found: CARD_NOT_FOUND,
                failed: "Failed to create card",
            },
        )
    }

    /// Only the supplied sides change; `updated_at` is always refreshed.
    /// The card is matched on `id` alone and moved to `input.deck_id`.
    pub async fn update_card(&self, input: CardUpdate) -> QueryResult<Card> {
        settle(self.repo.update_card(&input, None).await, UPDATE_CARD)
    }

    /// Like `update_card`, but the row must already sit in `input.deck_id`;
    /// a card from any other deck reports "Card not found".
    pub async fn update_card_in_deck(&self, input: CardUpdate) -> QueryResult<Card> {
        settle(self.repo.update_card(&input, Some(input.deck_id)).await, UPDATE_CARD)
    }

    pub async fn delete_card(&self, id: CardId) -> QueryResult<Card> {
        settle(self.repo.delete_card(id, None).await, DELETE_CARD)
    }

    /// Deletes the card only while it belongs to `deck_id`.
    pub async fn delete_card_in_deck(&self, id: CardId, deck_id: DeckId) -> QueryResult<Card> {
        settle(self.repo.delete_card(id, Some(deck_id)).await, DELETE_CARD)
    }
}
