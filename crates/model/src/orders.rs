//! Open orders as reported by an exchange.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side, derived from the sign of the order amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// A single open order.
///
/// `amount` is signed: positive buys, negative sells. Market orders carry no
/// price. `kind` is the venue's order-type string, passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub kind: Option<String>,
}

impl Order {
    pub fn new(id: impl Into<String>, price: Option<Decimal>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            price,
            amount,
            kind: None,
        }
    }

    /// Side of the order, `None` when the amount is zero.
    pub fn side(&self) -> Option<OrderSide> {
        if self.amount > Decimal::ZERO {
            Some(OrderSide::Buy)
        } else if self.amount < Decimal::ZERO {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }
}

/// The set of open orders for one subscription.
///
/// Equality compares the set of order ids only: exchanges reshuffle order in
/// their listings and mutate per-order bookkeeping fields without any order
/// actually appearing or disappearing, and the router should not fire on
/// that noise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenOrders(Vec<Order>);

impl OpenOrders {
    pub fn new(orders: Vec<Order>) -> Self {
        Self(orders)
    }

    pub fn orders(&self) -> &[Order] {
        &self.0
    }

    pub fn ids(&self) -> BTreeSet<&str> {
        self.0.iter().map(|o| o.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.0.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for OpenOrders {
    fn eq(&self, other: &Self) -> bool {
        self.ids() == other.ids()
    }
}

impl Eq for OpenOrders {}
