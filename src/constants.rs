pub const ODDS_API_URL: &str = "https://api.the-odds-api.com";
pub const ODDS_API_SPORT: &str = "mma_mixed_martial_arts";
pub const ODDS_API_REGIONS: &str = "us";
pub const ODDS_API_MARKETS: &str = "h2h";
pub const ODDS_API_FORMAT: &str = "american";
pub const ODDS_API_SPORT_FILTER: &str = "mma";

/// Name given to events whose feed record carries no usable title.
pub const FALLBACK_EVENT_NAME: &str = "UFC Event";

/// Market keys that denote a two-outcome head-to-head market.
pub const HEAD_TO_HEAD_MARKETS: &[&str] = &["h2h"];

/// Promotions whose cards are numbered ("UFC 312", "Bellator 300").
pub const NUMBERED_PROMOTIONS: &[&str] = &["ufc", "bellator", "pfl", "one", "rizin", "ksw", "lfa", "cwfc"];

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
