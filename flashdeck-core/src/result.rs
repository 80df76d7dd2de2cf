//! The envelope every query service hands back to the presentation layer.
//!
//! A `QueryResult` is either data or an error message, never both. Callers
//! check the error before touching data, and storage faults never surface as
//! panics or raw backend errors.

use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryResult<T> {
    Ok(T),
    Err(String),
}

impl<T> QueryResult<T> {
    pub fn ok(data: T) -> Self {
        QueryResult::Ok(data)
    }

    pub fn err(message: impl Into<String>) -> Self {
        QueryResult::Err(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, QueryResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryResult::Ok(data) => Some(data),
            QueryResult::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryResult::Ok(_) => None,
            QueryResult::Err(message) => Some(message),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            QueryResult::Ok(data) => Some(data),
            QueryResult::Err(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        self.into()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        match self {
            QueryResult::Ok(data) => QueryResult::Ok(f(data)),
            QueryResult::Err(message) => QueryResult::Err(message),
        }
    }
}

impl<T> From<QueryResult<T>> for Result<T, String> {
    fn from(r: QueryResult<T>) -> Self {
        match r {
            QueryResult::Ok(data) => Ok(data),
            QueryResult::Err(message) => Err(message),
        }
    }
}

// Wire shape: `{"data": ..., "error": null}` or `{"data": null, "error": "..."}`.
impl<T: Serialize> Serialize for QueryResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("QueryResult", 2)?;
        s.serialize_field("data", &self.data())?;
        s.serialize_field("error", &self.error())?;
        s.end()
    }
}
