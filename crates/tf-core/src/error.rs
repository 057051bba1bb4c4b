//! Error type for the filtering engine.
//!
//! None of these escape into the host page: the bridge turns them into a
//! `{ success: false }` response and the context falls back to showing
//! every tile.

/// Error type for settings decoding, messaging and pattern building.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Unknown message type: {0}")]
    UnknownMessage(String),
    #[error("Failed to build pattern for keyword '{keyword}': {source}")]
    Pattern {
        keyword: String,
        #[source]
        source: regex::Error,
    },
    #[error("Settings store failure: {0}")]
    Store(String),
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidSettings(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
