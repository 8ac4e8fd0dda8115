use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event as the feed describes it, before any reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub feed_id: String,
    pub title: Option<String>,
    pub sport_key: Option<String>,
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<RawMarket>,
}

impl RawEvent {
    /// Identifier used when reporting a skipped record.
    pub fn identifier(&self) -> String {
        match &self.title {
            Some(title) => format!("{} ({})", self.feed_id, title),
            None => self.feed_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMarket {
    /// Bookmaker the market was nested under, if any.
    pub bookmaker: Option<String>,
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOutcome {
    pub name: Option<String>,
    /// Price as the feed sent it; numbers are carried as their decimal text.
    pub price: Option<String>,
}

impl RawOutcome {
    pub fn new(name: &str, price: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            price: Some(price.to_string()),
        }
    }
}

/// One element of a feed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRecord {
    Event(RawEvent),
    Rejected { raw_identifier: String, reason: String },
}
