pub mod errors;
pub mod models;
pub mod queries;
pub mod repo;
pub mod result;

pub use errors::*;
pub use models::*;
pub use queries::{CardQueries, DeckQueries, CARD_NOT_FOUND, DECK_NOT_FOUND};
pub use repo::*;
pub use result::*;
