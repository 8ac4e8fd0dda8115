use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Feed malformed: {0}")]
    FeedMalformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Event not found: {0}")]
    EventNotFound(i64),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Feed-level failures abort a whole pass.
    pub fn is_feed_failure(&self) -> bool {
        matches!(self, Error::FeedUnavailable(_) | Error::FeedMalformed(_))
    }

    /// Only transport-level feed failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::FeedUnavailable(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::FeedUnavailable(e.to_string())
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(e: sea_orm::DbErr) -> Self {
        Error::Database(e.to_string())
    }
}
