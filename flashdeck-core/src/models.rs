use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub type DeckId = i64;
pub type CardId = i64;
pub type UserId = String;

/// Upper bound on a deck title, counted in UTF-16 code units like the
/// `varchar(255)` column it lands in.
pub const TITLE_MAX_LEN: usize = 255;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub id: DeckId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the dashboard aggregation: a deck plus how many cards it holds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckWithCardCount {
    #[serde(flatten)]
    pub deck: Deck,
    pub card_count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDeck {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
}

impl NewDeck {
    pub fn new(user_id: impl Into<UserId>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)
    }
}

/// Partial deck update. `None` fields are left untouched; for `description`,
/// `Some(None)` clears the column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeckUpdate {
    pub id: DeckId,
    pub user_id: UserId,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl DeckUpdate {
    pub fn new(id: DeckId, user_id: impl Into<UserId>) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            title: None,
            description: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match &self.title {
            Some(t) => validate_title(t),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCard {
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
}

impl NewCard {
    pub fn new(deck_id: DeckId, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            deck_id,
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Partial card update, scoped to the deck the caller believes holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardUpdate {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: Option<String>,
    pub back: Option<String>,
}

impl CardUpdate {
    pub fn new(id: CardId, deck_id: DeckId) -> Self {
        Self {
            id,
            deck_id,
            front: None,
            back: None,
        }
    }

    pub fn front(mut self, front: impl Into<String>) -> Self {
        self.front = Some(front.into());
        self
    }

    pub fn back(mut self, back: impl Into<String>) -> Self {
        self.back = Some(back.into());
        self
    }
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.encode_utf16().count() > TITLE_MAX_LEN {
        return Err(CoreError::Invalid("deck title longer than 255 UTF-16 code units"));
    }
    Ok(())
}
