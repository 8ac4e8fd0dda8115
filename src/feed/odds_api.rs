//! The Odds API client and payload mapping

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

use super::models::*;
use super::traits::FeedSource;
use crate::config::FeedConfig;
use crate::error::{Error, Result};

pub struct OddsApiClient {
    config: FeedConfig,
    http: HttpClient,
}

impl OddsApiClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// `{base}/v4/sports/{sport}/odds/` with the configured query parameters.
    pub fn odds_url(&self) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/v4/sports/{}/odds/", base, self.config.sport))?;

        url.query_pairs_mut()
            .append_pair("regions", &self.config.regions)
            .append_pair("markets", &self.config.markets)
            .append_pair("oddsFormat", &self.config.odds_format)
            .append_pair("apiKey", &self.config.api_key);

        Ok(url)
    }

    async fn fetch_payload(&self) -> Result<Value> {
        let url = self.odds_url()?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::FeedUnavailable(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::FeedUnavailable(format!("HTTP {}: {}", status, body)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::FeedUnavailable(e.without_url().to_string()))?;

        serde_json::from_str(&body).map_err(|e| Error::FeedMalformed(format!("payload is not JSON: {}", e)))
    }
}

#[async_trait]
impl FeedSource for OddsApiClient {
    fn name(&self) -> &str {
        "the-odds-api"
    }

    async fn fetch_raw_events(&self) -> Result<Vec<FeedRecord>> {
        let payload = self.fetch_payload().await?;
        let records = map_payload(&payload, self.config.sport_filter.as_deref())?;

        info!("📥 Fetched {} records from {}", records.len(), self.name());
        Ok(records)
    }
}

// ============================================================================
// Payload mapping
// ============================================================================

/// Map a decoded payload into feed records.
///
/// Only a non-array payload is fatal. Elements that are not objects become
/// rejected records; absent or wrongly-typed fields inside an event are
/// treated as empty.
pub fn map_payload(payload: &Value, sport_filter: Option<&str>) -> Result<Vec<FeedRecord>> {
    let items = payload.as_array().ok_or_else(|| {
        Error::FeedMalformed(format!("expected an array of events, got {}", json_kind(payload)))
    })?;

    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            records.push(FeedRecord::Rejected {
                raw_identifier: format!("feed[{}]", index),
                reason: format!("record is {}, not an object", json_kind(item)),
            });
            continue;
        };

        let event = map_event(obj, index);

        if let (Some(filter), Some(sport_key)) = (sport_filter, event.sport_key.as_deref()) {
            if !sport_key.to_lowercase().contains(filter) {
                debug!("Dropping {} (sport {} outside filter {})", event.feed_id, sport_key, filter);
                continue;
            }
        }

        records.push(FeedRecord::Event(event));
    }

    Ok(records)
}

pub fn map_event(obj: &Map<String, Value>, index: usize) -> RawEvent {
    let feed_id = obj
        .get("id")
        .and_then(scalar_text)
        .unwrap_or_else(|| format!("feed[{}]", index));

    let title = text_field(obj, "title").or_else(|| text_field(obj, "sport_title"));

    let mut markets = Vec::new();

    for bookmaker in array_field(obj, "bookmakers") {
        let Some(bookmaker) = bookmaker.as_object() else {
            continue;
        };
        let bookmaker_key = text_field(bookmaker, "key").or_else(|| text_field(bookmaker, "title"));

        for market in array_field(bookmaker, "markets") {
            if let Some(market) = market.as_object() {
                markets.push(map_market(market, bookmaker_key.clone()));
            }
        }
    }

    // Some payloads carry markets directly on the event.
    for market in array_field(obj, "markets") {
        if let Some(market) = market.as_object() {
            markets.push(map_market(market, None));
        }
    }

    RawEvent {
        feed_id,
        title,
        sport_key: text_field(obj, "sport_key"),
        commence_time: obj.get("commence_time").and_then(parse_commence_time),
        markets,
    }
}

fn map_market(obj: &Map<String, Value>, bookmaker: Option<String>) -> RawMarket {
    let outcomes = array_field(obj, "outcomes")
        .iter()
        .map(|outcome| match outcome.as_object() {
            Some(o) => RawOutcome {
                name: text_field(o, "name"),
                price: o.get("price").and_then(scalar_text),
            },
            None => RawOutcome::default(),
        })
        .collect();

    RawMarket {
        bookmaker,
        key: text_field(obj, "key").unwrap_or_default(),
        outcomes,
    }
}

/// RFC 3339 text or unix seconds.
pub fn parse_commence_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
