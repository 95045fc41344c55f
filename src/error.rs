// Error taxonomy for the store, adapters and host commands

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Persisted hide list does not parse. Never auto-recovered.
    #[error("hide list is malformed: {0}")]
    Parse(String),

    /// A site's markup no longer has the shape its adapter expects
    #[error("{site}: could not extract company name: {reason}")]
    Extraction { site: &'static str, reason: String },

    /// The insertion anchor for the hide control is missing
    #[error("{site}: could not bind hide control: {reason}")]
    Bind { site: &'static str, reason: String },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("company name must not be empty")]
    EmptyName,

    /// Concurrent writers kept changing the list between our read and write
    #[error("hide list kept changing under concurrent writers ({0} attempts)")]
    Contention(usize),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("could not encode hide list: {0}")]
    Encode(String),

    #[error("observation loop has stopped")]
    LoopClosed,

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn extraction(site: &'static str, reason: impl Into<String>) -> Self {
        Error::Extraction { site, reason: reason.into() }
    }

    pub(crate) fn bind(site: &'static str, reason: impl Into<String>) -> Self {
        Error::Bind { site, reason: reason.into() }
    }

    /// Per-element failures that a binding pass logs and skips
    pub fn is_element_local(&self) -> bool {
        matches!(self, Error::Extraction { .. } | Error::Bind { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
