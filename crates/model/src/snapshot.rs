//! The union of canonical shapes stored in the router's results table.

use crate::{Balances, OpenOrders, OrderBook, Positions};

/// A parsed subscription value.
///
/// Adapters return one of these from their parse callbacks; the router keeps
/// the last value per subscription and compares with `==` to decide whether
/// the change is worth dispatching. `Raw` exists for endpoints that have no
/// canonical shape; its equality is `serde_json::Value`'s structural
/// equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    OrderBook(OrderBook),
    Balances(Balances),
    Positions(Positions),
    Orders(OpenOrders),
    Raw(serde_json::Value),
}

impl Snapshot {
    pub fn as_order_book(&self) -> Option<&OrderBook> {
        match self {
            Snapshot::OrderBook(book) => Some(book),
            _ => None,
        }
    }

    pub fn as_balances(&self) -> Option<&Balances> {
        match self {
            Snapshot::Balances(balances) => Some(balances),
            _ => None,
        }
    }

    pub fn as_positions(&self) -> Option<&Positions> {
        match self {
            Snapshot::Positions(positions) => Some(positions),
            _ => None,
        }
    }

    pub fn as_orders(&self) -> Option<&OpenOrders> {
        match self {
            Snapshot::Orders(orders) => Some(orders),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&serde_json::Value> {
        match self {
            Snapshot::Raw(value) => Some(value),
            _ => None,
        }
    }
}

impl From<OrderBook> for Snapshot {
    fn from(book: OrderBook) -> Self {
        Snapshot::OrderBook(book)
    }
}

impl From<Balances> for Snapshot {
    fn from(balances: Balances) -> Self {
        Snapshot::Balances(balances)
    }
}

impl From<Positions> for Snapshot {
    fn from(positions: Positions) -> Self {
        Snapshot::Positions(positions)
    }
}

impl From<OpenOrders> for Snapshot {
    fn from(orders: OpenOrders) -> Self {
        Snapshot::Orders(orders)
    }
}

impl From<serde_json::Value> for Snapshot {
    fn from(value: serde_json::Value) -> Self {
        Snapshot::Raw(value)
    }
}
