//! Query services: the boundary the presentation layer calls.
//!
//! Each operation runs one repository call and settles its outcome into a
//! [`QueryResult`]. Not-found outcomes become `"<Entity> not found"`; every
//! other failure is logged and collapsed into a generic
//! `"Failed to <verb> <entity>"` message.

use crate::{CoreError, QueryResult};
use tracing::{debug, error, warn};

pub mod cards;
pub mod decks;

pub use cards::CardQueries;
pub use decks::DeckQueries;

pub const DECK_NOT_FOUND: &str = "Deck not found";
pub const CARD_NOT_FOUND: &str = "Card not found";

/// Messages attached to one operation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Outcome {
    pub op: &'static str,
    pub not_found: &'static str,
    pub failed: &'static str,
}

pub(crate) fn settle<T>(res: Result<T, CoreError>, outcome: Outcome) -> QueryResult<T> {
    match res {
        Ok(data) => QueryResult::ok(data),
        Err(CoreError::NotFound(what)) => {
            debug!(op = outcome.op, what, "no matching row");
            QueryResult::err(outcome.not_found)
        }
        Err(e @ CoreError::Invalid(_)) => {
            warn!(op = outcome.op, error = %e, "rejected input");
            QueryResult::err(outcome.failed)
        }
        Err(e) => {
            error!(op = outcome.op, error = %e, "{}", outcome.failed);
            QueryResult::err(outcome.failed)
        }
    }
}
