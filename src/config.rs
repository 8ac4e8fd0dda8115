use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: String,
    pub sport: String,
    pub regions: String,
    pub markets: String,
    pub odds_format: String,
    /// Events whose `sport_key` does not contain this are dropped.
    pub sport_filter: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` runs against the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub max_fetch_attempts: u32,
    pub retry_backoff: Duration,
    /// Period of scheduled passes; `None` means passes only run on `GET /sync`.
    pub interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = var("ODDS_API_KEY")
            .ok_or_else(|| Error::Config("ODDS_API_KEY not set".into()))?;

        let feed = FeedConfig {
            base_url: var("ODDS_API_URL").unwrap_or_else(|| ODDS_API_URL.to_string()),
            api_key,
            sport: var("ODDS_SPORT").unwrap_or_else(|| ODDS_API_SPORT.to_string()),
            regions: var("ODDS_REGIONS").unwrap_or_else(|| ODDS_API_REGIONS.to_string()),
            markets: var("ODDS_MARKETS").unwrap_or_else(|| ODDS_API_MARKETS.to_string()),
            odds_format: var("ODDS_FORMAT").unwrap_or_else(|| ODDS_API_FORMAT.to_string()),
            sport_filter: match lookup("ODDS_SPORT_FILTER") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_lowercase()),
                None => Some(ODDS_API_SPORT_FILTER.to_string()),
            },
            timeout: Duration::from_secs(parse_or("FEED_TIMEOUT_SECS", var("FEED_TIMEOUT_SECS"), 20)?),
        };

        let database = DatabaseConfig {
            url: var("DATABASE_URL"),
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", var("DATABASE_MAX_CONNECTIONS"), 5)?,
        };

        let bind_addr = var("SYNC_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let server = ServerConfig {
            bind_addr: bind_addr
                .parse()
                .map_err(|_| Error::Config(format!("SYNC_BIND_ADDR is not a socket address: {}", bind_addr)))?,
        };

        let max_fetch_attempts: u32 = parse_or("FEED_MAX_ATTEMPTS", var("FEED_MAX_ATTEMPTS"), 3)?;
        if max_fetch_attempts == 0 {
            return Err(Error::Config("FEED_MAX_ATTEMPTS must be at least 1".into()));
        }

        let interval = var("SYNC_INTERVAL_SECS")
            .map(|v| parse_value::<u64>("SYNC_INTERVAL_SECS", &v))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let sync = SyncConfig {
            max_fetch_attempts,
            retry_backoff: Duration::from_millis(parse_or("FEED_RETRY_BACKOFF_MS", var("FEED_RETRY_BACKOFF_MS"), 500)?),
            interval,
        };

        Ok(Config {
            feed,
            database,
            server,
            sync,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, raw)))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: ODDS_API_URL.to_string(),
            api_key: String::new(),
            sport: ODDS_API_SPORT.to_string(),
            regions: ODDS_API_REGIONS.to_string(),
            markets: ODDS_API_MARKETS.to_string(),
            odds_format: ODDS_API_FORMAT.to_string(),
            sport_filter: Some(ODDS_API_SPORT_FILTER.to_string()),
            timeout: Duration::from_secs(20),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_fetch_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = Config::from_lookup(lookup(&[("ODDS_API_KEY", "secret")])).unwrap();

        assert_eq!(config.feed.api_key, "secret");
        assert_eq!(config.feed.base_url, ODDS_API_URL);
        assert_eq!(config.feed.sport, "mma_mixed_martial_arts");
        assert_eq!(config.feed.odds_format, "american");
        assert_eq!(config.feed.sport_filter.as_deref(), Some("mma"));
        assert!(config.database.url.is_none());
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.sync.max_fetch_attempts, 3);
        assert!(config.sync.interval.is_none());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("ODDS_API_KEY")));
    }

    #[test]
    fn test_empty_sport_filter_disables_filtering() {
        let config = Config::from_lookup(lookup(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_SPORT_FILTER", ""),
            ("SYNC_INTERVAL_SECS", "900"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]))
        .unwrap();

        assert!(config.feed.sport_filter.is_none());
        assert_eq!(config.sync.interval, Some(Duration::from_secs(900)));
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[("ODDS_API_KEY", "k"), ("FEED_MAX_ATTEMPTS", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup(&[("ODDS_API_KEY", "k"), ("FEED_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup(&[("ODDS_API_KEY", "k"), ("SYNC_BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
