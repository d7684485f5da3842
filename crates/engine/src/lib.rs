//! The strategy execution and event-routing engine.
//!
//! Strategies are cooperatively scheduled logical tasks. Each one is an
//! async function that only ever suspends through this crate's primitives;
//! the executor steps every task by hand, so two strategies never observe
//! each other's partial state and the whole schedule is deterministic for a
//! given event order.
//!
//! ```text
//! ┌──────────┐ next_event ┌──────────┐ deliver/resume ┌────────────────┐
//! │   Host   │───────────>│ Executor │───────────────>│ strategy tasks │
//! │ (pollers,│            │  - fan   │                │  ctx.on(..)    │
//! │  sends,  │<───────────│    out   │<───────────────│  ctx.send(..)  │
//! │  signals)│ subscribe/ │  - sweep │  want predicates│  ctx.atexit(..)│
//! └──────────┘    send    └──────────┘                └────────────────┘
//! ```
//!
//! A suspended task leaves behind a *want*: a predicate deciding which
//! event, if any, should wake it. The executor never needs to know why a
//! task suspended, only whether an event matches.

mod atexit;
mod error;
mod executor;
mod registry;
mod router;
mod send;
pub mod sim;
mod store;
mod task;
mod timer;

pub use error::{EngineError, ParseError};
pub use executor::{Executor, ExecutorConfig};
pub use registry::{StrategyRegistry, StrategyResult};
pub use router::{exit, Extractor, Results, SubscriptionId, Tick};
pub use task::{AtexitKey, StrategyCtx};
pub use timer::Stopwatch;
