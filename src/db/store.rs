use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sync::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub event_date: DateTime<Utc>,
    pub is_active: bool,
}

impl Event {
    pub fn event_day(&self) -> NaiveDate {
        self.event_date.date_naive()
    }
}

/// An event that does not exist in the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub event_date: DateTime<Utc>,
    pub is_active: bool,
}

impl EventDraft {
    pub fn new(name: impl Into<String>, event_date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            event_date,
            is_active: true,
        }
    }

    /// Natural key of the event this draft would create.
    pub fn natural_key(&self) -> (String, NaiveDate) {
        (normalize(&self.name), self.event_date.date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fight {
    pub id: i64,
    pub event_id: i64,
    pub fighter_a_name: String,
    pub fighter_b_name: String,
    pub odds_a: Option<f64>,
    pub odds_b: Option<f64>,
    pub winner: Option<String>,
}

/// Fight fields the pipeline writes. `winner` is never among them.
#[derive(Debug, Clone, PartialEq)]
pub struct FightUpsert {
    pub event_id: i64,
    pub fighter_a_name: String,
    pub fighter_b_name: String,
    pub odds_a: Option<f64>,
    pub odds_b: Option<f64>,
}

/// Persistence handle shared by the sync pipeline and the read routes.
///
/// Every write is a single upsert keyed by the record's natural key and is
/// atomic on its own. Nothing is transactional across calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// All events, ordered by `event_date` ascending.
    async fn list_events(&self) -> Result<Vec<Event>>;

    /// Insert or update the event keyed by `(normalize(name), event day)`.
    async fn upsert_event(&self, draft: &EventDraft) -> Result<Event>;

    /// Mark a matched event active, optionally moving its start time.
    async fn refresh_event(&self, id: i64, event_date: Option<DateTime<Utc>>) -> Result<()>;

    /// Insert or update the fight keyed by `(event_id, fighter_a_name, fighter_b_name)`.
    async fn upsert_fight(&self, fight: &FightUpsert) -> Result<()>;

    async fn find_event(&self, id: i64) -> Result<Option<Event>>;

    async fn fights_for_event(&self, event_id: i64) -> Result<Vec<Fight>>;
}
