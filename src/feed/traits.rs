use async_trait::async_trait;

use super::models::FeedRecord;
use crate::error::Result;

/// A source of raw event payloads.
///
/// Implementations fail with `FeedUnavailable` when the upstream cannot be
/// reached or answers with a non-success status, and with `FeedMalformed`
/// when the payload is not a sequence of records. They never retry and never
/// touch persisted state.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_raw_events(&self) -> Result<Vec<FeedRecord>>;
}
