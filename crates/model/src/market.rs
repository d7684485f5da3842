//! Market identifier grammar: `"<market_type>:<BASE>/<QUOTE>"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of market a symbol refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    /// Spot market.
    Spot,
    /// Perpetual swap market.
    Swap,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::Spot => write!(f, "spot"),
            MarketType::Swap => write!(f, "swap"),
        }
    }
}

impl FromStr for MarketType {
    type Err = MarketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(MarketType::Spot),
            "swap" => Ok(MarketType::Swap),
            other => Err(MarketParseError::UnknownMarketType(other.to_string())),
        }
    }
}

/// A fully qualified market identifier, e.g. `spot:BTC/USDT`.
///
/// Splitting the identifier into `(base, quote, market_type)` is the first
/// step of every adapter operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketId {
    pub market_type: MarketType,
    pub base: String,
    pub quote: String,
}

impl MarketId {
    pub fn new(market_type: MarketType, base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            market_type,
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// The `BASE/QUOTE` pair without the market type prefix.
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.market_type, self.base, self.quote)
    }
}

impl FromStr for MarketId {
    type Err = MarketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (market_type, pair) = s
            .split_once(':')
            .ok_or_else(|| MarketParseError::MissingMarketType(s.to_string()))?;
        let (base, quote) = pair
            .split_once('/')
            .ok_or_else(|| MarketParseError::MissingQuote(s.to_string()))?;
        if base.is_empty() || quote.is_empty() {
            return Err(MarketParseError::MissingQuote(s.to_string()));
        }
        Ok(MarketId {
            market_type: market_type.parse()?,
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }
}

/// Errors from parsing a market identifier.
#[derive(Debug, Clone, Error)]
pub enum MarketParseError {
    /// The identifier has no `<market_type>:` prefix.
    #[error("market identifier '{0}' is missing the market type prefix")]
    MissingMarketType(String),

    /// The pair has no `/QUOTE` part.
    #[error("market identifier '{0}' is missing the quote currency")]
    MissingQuote(String),

    /// The market type is not one of `spot`, `swap`.
    #[error("unknown market type '{0}', expected 'spot' or 'swap'")]
    UnknownMarketType(String),
}
