//! Net positions keyed by symbol.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Signed net positions per symbol (positive = long, negative = short).
///
/// Like [`crate::Balances`], lookup of an absent symbol yields zero and
/// equality compares the union of keys, so flat positions may be omitted
/// without affecting change detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Positions(HashMap<String, Decimal>);

impl Positions {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, symbol: impl Into<String>, quantity: Decimal) {
        self.0.insert(symbol.into(), quantity);
    }

    /// Net quantity for `symbol`, zero if absent.
    pub fn get(&self, symbol: &str) -> Decimal {
        self.0.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for Positions {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl PartialEq for Positions {
    fn eq(&self, other: &Self) -> bool {
        self.0
            .keys()
            .chain(other.0.keys())
            .all(|symbol| self.get(symbol) == other.get(symbol))
    }
}

impl Eq for Positions {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_symbol_is_zero() {
        let positions = Positions::new();
        assert_eq!(positions.get("spot:BTC/USDT"), Decimal::ZERO);
    }

    #[test]
    fn test_explicit_zero_equals_absent() {
        let mut a = Positions::new();
        a.insert("swap:BTC/USDT", dec!(0));
        let b = Positions::new();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_carries_direction() {
        let mut a = Positions::new();
        a.insert("swap:BTC/USDT", dec!(-0.5));
        let mut b = Positions::new();
        b.insert("swap:BTC/USDT", dec!(0.5));
        assert_ne!(a, b);
    }
}
