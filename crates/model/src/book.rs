//! Order book snapshot with ordered price levels.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price level: price and the quantity resting at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl Level {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }
}

/// An order book snapshot.
///
/// Bids are held in descending price order, asks ascending; the constructor
/// enforces this regardless of input order. Equality is element-wise over
/// both sides, which makes two snapshots of an unchanged book compare equal
/// and is what drives the router's change-only dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderBook {
    bids: Vec<Level>,
    asks: Vec<Level>,
}

impl OrderBook {
    /// Build a snapshot from raw levels, sorting each side into canonical
    /// order and dropping empty levels.
    pub fn new(bids: Vec<(Decimal, Decimal)>, asks: Vec<(Decimal, Decimal)>) -> Self {
        let mut bids: Vec<Level> = bids
            .into_iter()
            .filter(|(_, q)| !q.is_zero())
            .map(|(p, q)| Level::new(p, q))
            .collect();
        let mut asks: Vec<Level> = asks
            .into_iter()
            .filter(|(_, q)| !q.is_zero())
            .map(|(p, q)| Level::new(p, q))
            .collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self { bids, asks }
    }

    /// Bid levels, highest price first.
    pub fn bids(&self) -> &[Level] {
        &self.bids
    }

    /// Ask levels, lowest price first.
    pub fn asks(&self) -> &[Level] {
        &self.asks
    }

    /// Returns the best (highest) bid.
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.first().copied()
    }

    /// Returns the best (lowest) ask.
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.first().copied()
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some((bid.price + ask.price) / Decimal::TWO)
    }

    /// Spread (best ask - best bid).
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(ask.price - bid.price)
    }

    /// Returns true if neither side has any levels.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
