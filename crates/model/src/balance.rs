//! Account balances keyed by asset.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance of a single asset.
///
/// `debt` is only reported by margin-capable venues; a missing debt field is
/// equivalent to zero for comparison purposes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Balance {
    pub free: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
    pub debt: Option<Decimal>,
}

impl Balance {
    pub const ZERO: Balance = Balance {
        free: Decimal::ZERO,
        locked: Decimal::ZERO,
        total: Decimal::ZERO,
        debt: None,
    };

    pub fn debt_or_zero(&self) -> Decimal {
        self.debt.unwrap_or(Decimal::ZERO)
    }
}

impl PartialEq for Balance {
    fn eq(&self, other: &Self) -> bool {
        self.free == other.free
            && self.locked == other.locked
            && self.total == other.total
            && self.debt_or_zero() == other.debt_or_zero()
    }
}

impl Eq for Balance {}

/// Balances for all assets of an account.
///
/// Lookup of an absent asset yields [`Balance::ZERO`], and equality compares
/// the union of keys with the same zero default, so an adapter that stops
/// reporting a drained asset does not produce a spurious change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balances(HashMap<String, Balance>);

impl Balances {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, asset: impl Into<String>, balance: Balance) {
        self.0.insert(asset.into(), balance);
    }

    /// Balance for `asset`, zero if the asset is not present.
    pub fn get(&self, asset: &str) -> Balance {
        self.0.get(asset).copied().unwrap_or(Balance::ZERO)
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Balance)> for Balances {
    fn from_iter<I: IntoIterator<Item = (String, Balance)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl PartialEq for Balances {
    fn eq(&self, other: &Self) -> bool {
        self.0
            .keys()
            .chain(other.0.keys())
            .all(|asset| self.get(asset) == other.get(asset))
    }
}

impl Eq for Balances {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bal(free: Decimal, locked: Decimal) -> Balance {
        Balance {
            free,
            locked,
            total: free + locked,
            debt: None,
        }
    }

    #[test]
    fn test_missing_asset_is_zero() {
        let balances = Balances::new();
        assert_eq!(balances.get("BTC"), Balance::ZERO);
    }

    #[test]
    fn test_union_equality_treats_missing_as_zero() {
        let mut a = Balances::new();
        a.insert("BTC", bal(dec!(1), dec!(0)));
        a.insert("ETH", Balance::ZERO);

        let mut b = Balances::new();
        b.insert("BTC", bal(dec!(1), dec!(0)));

        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn test_inequality_on_changed_amount() {
        let mut a = Balances::new();
        a.insert("BTC", bal(dec!(1), dec!(0)));
        let mut b = Balances::new();
        b.insert("BTC", bal(dec!(2), dec!(0)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_absent_debt_equals_zero_debt() {
        let explicit = Balance {
            debt: Some(dec!(0)),
            ..bal(dec!(1), dec!(0))
        };
        let implicit = bal(dec!(1), dec!(0));
        assert_eq!(explicit, implicit);
    }
}
