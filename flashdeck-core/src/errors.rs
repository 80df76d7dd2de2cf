use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Wraps a backend fault with a short label naming the failed step.
    pub fn storage(context: &'static str, err: impl Display) -> Self {
        CoreError::Storage(format!("{context}: {err}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}
