//! All error types for the lingo crate.
//!
//! Parsing itself never fails on content: malformed lines are dropped and
//! unclosed blocks are discarded. Errors come from I/O, the JSON cache, and
//! the single fallible resolution step (count coercion).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] serde_json::Error),

    #[error("language `{0}` is not loaded")]
    UnknownLanguage(String),

    #[error("cannot coerce `{value}` to a count")]
    InvalidCount { value: String },
}

impl Error {
    /// Creates the count-coercion error for a variable's display form.
    pub fn invalid_count(value: impl Into<String>) -> Self {
        Error::InvalidCount {
            value: value.into(),
        }
    }
}
