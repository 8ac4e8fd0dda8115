use thiserror::Error;

use super::resolver::EventRef;
use crate::constants::HEAD_TO_HEAD_MARKETS;
use crate::feed::{RawEvent, RawMarket};

/// A fight read off one bookmaker's head-to-head market.
#[derive(Debug, Clone, PartialEq)]
pub struct FightCandidate {
    pub target: EventRef,
    pub fighter_a_name: String,
    pub fighter_b_name: String,
    pub odds_a: Option<f64>,
    pub odds_b: Option<f64>,
    pub bookmaker: Option<String>,
    /// Identifier of the raw event the candidate came from.
    pub source: String,
}

impl FightCandidate {
    pub fn label(&self) -> String {
        format!("{}: {} vs {}", self.source, self.fighter_a_name, self.fighter_b_name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("market {market} has an unnamed outcome at position {position}")]
    UnnamedOutcome { market: String, position: usize },
}

pub fn is_head_to_head(key: &str) -> bool {
    HEAD_TO_HEAD_MARKETS.iter().any(|k| k.eq_ignore_ascii_case(key.trim()))
}

/// Parse a feed price. American ("-150", "+130") and decimal ("1.67") odds
/// are kept as given; anything non-numeric is `None`.
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Every head-to-head market with at least two outcomes yields one candidate.
pub fn extract(raw: &RawEvent, target: EventRef) -> Result<Vec<FightCandidate>, ExtractError> {
    let mut fights = Vec::new();
    let source = raw.identifier();

    for market in raw.markets.iter().filter(|m| is_head_to_head(&m.key)) {
        if let Some(fight) = extract_market(market, target, &source)? {
            fights.push(fight);
        }
    }

    Ok(fights)
}

fn extract_market(
    market: &RawMarket,
    target: EventRef,
    source: &str,
) -> Result<Option<FightCandidate>, ExtractError> {
    let [a, b, ..] = market.outcomes.as_slice() else {
        return Ok(None);
    };

    let name_at = |position: usize, name: Option<&String>| {
        name.cloned().ok_or_else(|| ExtractError::UnnamedOutcome {
            market: market_label(market),
            position,
        })
    };

    Ok(Some(FightCandidate {
        target,
        fighter_a_name: name_at(0, a.name.as_ref())?,
        fighter_b_name: name_at(1, b.name.as_ref())?,
        odds_a: parse_price(a.price.as_deref()),
        odds_b: parse_price(b.price.as_deref()),
        bookmaker: market.bookmaker.clone(),
        source: source.to_string(),
    }))
}

fn market_label(market: &RawMarket) -> String {
    match &market.bookmaker {
        Some(bookmaker) => format!("{}/{}", bookmaker, market.key),
        None => market.key.clone(),
    }
}
