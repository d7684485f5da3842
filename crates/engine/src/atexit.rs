//! Per-strategy cleanup handlers.
//!
//! Handlers are async (cancelling open orders goes through `send`) and run
//! on clean termination, on failure before a restart, and during executor
//! shutdown inside the bounded window.

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::task::StrategyCtx;

/// Removes a registered handler when passed back to
/// [`StrategyCtx::remove_atexit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtexitKey(u64);

impl fmt::Display for AtexitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "atexit#{}", self.0)
    }
}

pub(crate) type Handler =
    Rc<dyn Fn(StrategyCtx) -> LocalBoxFuture<'static, Result<(), EngineError>>>;

/// Registered handlers, in registration order. Lives in the strategy-local
/// store under its own type key.
#[derive(Default)]
pub(crate) struct AtexitRegistry {
    next_key: u64,
    handlers: Vec<(AtexitKey, Handler)>,
}

impl AtexitRegistry {
    pub fn add(&mut self, handler: Handler) -> AtexitKey {
        self.next_key += 1;
        let key = AtexitKey(self.next_key);
        self.handlers.push((key, handler));
        key
    }

    pub fn remove(&mut self, key: AtexitKey) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(k, _)| *k != key);
        self.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// Runs every registered handler, swallowing and logging individual
/// failures. Handlers registered while this runs are not picked up.
pub(crate) async fn execute_atexit(ctx: StrategyCtx) {
    let handlers = ctx.with_locals(|locals| {
        locals
            .get_mut::<AtexitRegistry>()
            .map(|registry| std::mem::take(&mut registry.handlers))
            .unwrap_or_default()
    });

    if handlers.is_empty() {
        return;
    }
    debug!(strategy = %ctx.name(), count = handlers.len(), "running atexit handlers");

    for (key, handler) in handlers {
        if let Err(err) = handler(ctx.clone()).await {
            warn!(strategy = %ctx.name(), %key, error = %err, "atexit handler failed");
        }
    }
}
