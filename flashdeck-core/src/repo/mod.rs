use crate::{
    Card, CardId, CardUpdate, CoreError, Deck, DeckId, DeckUpdate, DeckWithCardCount, NewCard,
    NewDeck,
};
use async_trait::async_trait;

pub mod memory;

/// Storage backend. Every deck read or mutation takes the owner's id and
/// must apply it in the same predicate as the deck id; a deck owned by
/// someone else is reported as `CoreError::NotFound`.
#[async_trait]
pub trait Repository: Send + Sync {
    // Decks
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, CoreError>;
    async fn get_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError>;
    async fn create_deck(&self, input: &NewDeck) -> Result<Deck, CoreError>;
    async fn update_deck(&self, input: &DeckUpdate) -> Result<Deck, CoreError>;
    async fn delete_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError>;
    async fn list_decks_with_card_counts(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeckWithCardCount>, CoreError>;

    // Cards
    async fn list_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError>;
    async fn get_card(&self, id: CardId) -> Result<Card, CoreError>;
    async fn create_card(&self, input: &NewCard) -> Result<Card, CoreError>;
    /// Matches on `id`, narrowed to `deck_id = within` when given, and writes
    /// every field of `input` including `deck_id`.
    async fn update_card(
        &self,
        input: &CardUpdate,
        within: Option<DeckId>,
    ) -> Result<Card, CoreError>;
    async fn delete_card(&self, id: CardId, within: Option<DeckId>) -> Result<Card, CoreError>;
}
