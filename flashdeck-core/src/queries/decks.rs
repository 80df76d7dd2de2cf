use super::{settle, Outcome, DECK_NOT_FOUND};
use crate::{Deck, DeckId, DeckUpdate, DeckWithCardCount, NewDeck, QueryResult, Repository};
use std::sync::Arc;

/// Deck operations, always scoped to the requesting user.
#[derive(Clone)]
pub struct DeckQueries {
    repo: Arc<dyn Repository>,
}

impl DeckQueries {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn get_decks_by_user_id(&self, user_id: &str) -> QueryResult<Vec<Deck>> {
        settle(
            self.repo.list_decks(user_id).await,
            Outcome {
                op: "get_decks_by_user_id",
                not_found: DECK_NOT_FOUND,
                failed: "Failed to get decks",
            },
        )
    }

    /// A deck owned by another user is indistinguishable from a missing one.
    pub async fn get_deck_by_id(&self, id: DeckId, user_id: &str) -> QueryResult<Deck> {
        settle(
            self.repo.get_deck(id, user_id).await,
            Outcome {
                op: "get_deck_by_id",
                not_found: DECK_NOT_FOUND,
                failed: "Failed to get deck",
            },
        )
    }

    pub async fn create_deck(&self, input: NewDeck) -> QueryResult<Deck> {
        let res = match input.validate() {
            Ok(()) => self.repo.create_deck(&input).await,
            Err(e) => Err(e),
        };
        settle(
            res,
            Outcome {
                op: "create_deck",
                not_found: DECK_NOT_FOUND,
                failed: "Failed to create deck",
            },
        )
    }

    pub async fn update_deck(&self, input: DeckUpdate) -> QueryResult<Deck> {
        let res = match input.validate() {
            Ok(()) => self.repo.update_deck(&input).await,
            Err(e) => Err(e),
        };
        settle(
            res,
            Outcome {
                op: "update_deck",
                not_found: DECK_NOT_FOUND,
                failed: "Failed to update deck",
            },
        )
    }

    /// Removes the deck and, through the foreign key, all of its cards.
    pub async fn delete_deck(&self, id: DeckId, user_id: &str) -> QueryResult<Deck> {
        settle(
            self.repo.delete_deck(id, user_id).await,
            Outcome {
                op: "delete_deck",
                not_found: DECK_NOT_FOUND,
                failed: "Failed to delete deck",
            },
        )
    }

    /// Dashboard listing: every deck of the user with its card count,
    /// least recently updated first. Empty decks report a count of zero.
    pub async fn get_decks_with_card_counts(
        &self,
        user_id: &str,
    ) -> QueryResult<Vec<DeckWithCardCount>> {
        settle(
            self.repo.list_decks_with_card_counts(user_id).await,
            Outcome {
                op: "get_decks_with_card_counts",
                not_found: DECK_NOT_FOUND,
                failed: "Failed to get decks",
            },
        )
    }
}
