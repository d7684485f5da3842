//! Canonical market data shapes shared by the engine and exchange adapters.
//!
//! Adapters parse exchange-specific JSON into these containers; the router
//! compares successive snapshots with plain `==` to decide whether a user
//! callback should fire. The equality semantics are therefore part of the
//! contract:
//!
//! - [`OrderBook`]: element-wise over ordered bid/ask levels
//! - [`Balances`]: union of asset keys, missing entries count as zero
//! - [`Positions`]: union of symbol keys, missing entries count as zero
//! - [`OpenOrders`]: equality is decided by the set of order ids
//!
//! [`Snapshot`] unions the four shapes (plus a raw JSON escape hatch) and is
//! the value adapters return from their parse callbacks.

mod balance;
mod book;
mod market;
mod math;
mod orders;
mod position;
mod snapshot;

pub use balance::{Balance, Balances};
pub use book::{Level, OrderBook};
pub use market::{MarketId, MarketParseError, MarketType};
pub use math::{ceil_to_decimals, floor_to_decimals, is_zero_str, round_to_decimals};
pub use orders::{OpenOrders, Order, OrderSide};
pub use position::Positions;
pub use snapshot::Snapshot;
