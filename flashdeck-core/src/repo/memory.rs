use crate::{
    Card, CardId, CardUpdate, CoreError, Deck, DeckId, DeckUpdate, DeckWithCardCount, NewCard,
    NewDeck,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Lock-protected maps standing in for the two tables. Ids are handed out
/// from 1 upward, like an identity column.
///
/// Locks are always taken decks first, then cards.
#[derive(Default)]
pub struct MemoryRepo {
    decks: RwLock<BTreeMap<DeckId, Deck>>,
    cards: RwLock<BTreeMap<CardId, Card>>,
    next_deck_id: AtomicI64,
    next_card_id: AtomicI64,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// Same outcome as the foreign key on `cards.deck_id`.
fn missing_deck(deck_id: DeckId) -> CoreError {
    CoreError::Storage(format!("foreign key violation: deck {deck_id} does not exist"))
}

fn in_scope(card: &Card, within: Option<DeckId>) -> bool {
    within.map_or(true, |deck_id| card.deck_id == deck_id)
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, CoreError> {
        Ok(self
            .decks
            .read()
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError> {
        self.decks
            .read()
            .get(&id)
            .filter(|d| d.user_id == user_id)
            .cloned()
            .ok_or(CoreError::NotFound("deck"))
    }

    async fn create_deck(&self, input: &NewDeck) -> Result<Deck, CoreError> {
        let now = Utc::now();
        let deck = Deck {
            id: Self::allocate(&self.next_deck_id),
            user_id: input.user_id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        self.decks.write().insert(deck.id, deck.clone());
        Ok(deck)
    }

    async fn update_deck(&self, input: &DeckUpdate) -> Result<Deck, CoreError> {
        let mut m = self.decks.write();
        let Some(deck) = m.get_mut(&input.id).filter(|d| d.user_id == input.user_id) else {
            return Err(CoreError::NotFound("deck"));
        };
        if let Some(title) = &input.title {
            deck.title = title.clone();
        }
        if let Some(description) = &input.description {
            deck.description = description.clone();
        }
        deck.updated_at = Utc::now();
        Ok(deck.clone())
    }

    async fn delete_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError> {
        let mut decks = self.decks.write();
        if !decks.get(&id).is_some_and(|d| d.user_id == user_id) {
            return Err(CoreError::NotFound("deck"));
        }
        let deck = decks.remove(&id).ok_or(CoreError::NotFound("deck"))?;
        self.cards.write().retain(|_, c| c.deck_id != id);
        Ok(deck)
    }

    async fn list_decks_with_card_counts(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeckWithCardCount>, CoreError> {
        let decks = self.decks.read();
        let cards = self.cards.read();
        let mut v: Vec<DeckWithCardCount> = decks
            .values()
            .filter(|d| d.user_id == user_id)
            .map(|d| DeckWithCardCount {
                deck: d.clone(),
                card_count: cards.values().filter(|c| c.deck_id == d.id).count() as i64,
            })
            .collect();
        v.sort_by_key(|r| (r.deck.updated_at, r.deck.id));
        Ok(v)
    }

    async fn list_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        Ok(self
            .cards
            .read()
            .values()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect())
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        self.cards
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn create_card(&self, input: &NewCard) -> Result<Card, CoreError> {
        // The decks guard lives until the insert so a concurrent
        // `delete_deck` cannot strand the new card.
        let decks = self.decks.read();
        if !decks.contains_key(&input.deck_id) {
            return Err(missing_deck(input.deck_id));
        }
        let now = Utc::now();
        let card = Card {
            id: Self::allocate(&self.next_card_id),
            deck_id: input.deck_id,
            front: input.front.clone(),
            back: input.back.clone(),
            created_at: now,
            updated_at: now,
        };
        self.cards.write().insert(card.id, card.clone());
        drop(decks);
        Ok(card)
    }

    async fn update_card(
        &self,
        input: &CardUpdate,
        within: Option<DeckId>,
    ) -> Result<Card, CoreError> {
        let decks = self.decks.read();
        let mut cards = self.cards.write();
        let Some(card) = cards.get_mut(&input.id).filter(|c| in_scope(c, within)) else {
            return Err(CoreError::NotFound("card"));
        };
        if !decks.contains_key(&input.deck_id) {
            return Err(missing_deck(input.deck_id));
        }
        card.deck_id = input.deck_id;
        if let Some(front) = &input.front {
            card.front = front.clone();
        }
        if let Some(back) = &input.back {
            card.back = back.clone();
        }
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    async fn delete_card(&self, id: CardId, within: Option<DeckId>) -> Result<Card, CoreError> {
        let mut cards = self.cards.write();
        if !cards.get(&id).is_some_and(|c| in_scope(c, within)) {
            return Err(CoreError::NotFound("card"));
        }
        cards.remove(&id).ok_or(CoreError::NotFound("card"))
    }
}
