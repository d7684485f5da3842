//! Compiled-in strategy discovery.

use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::task::StrategyCtx;

/// What a strategy's entry function resolves to.
pub type StrategyResult = Result<(), EngineError>;

type Factory = Rc<dyn Fn(StrategyCtx) -> LocalBoxFuture<'static, StrategyResult>>;

/// Maps unique strategy names to factories producing a fresh run of the
/// strategy. The executor builds a new task from the factory at startup and
/// after every restart, so strategies begin each life with no carried-over
/// state.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<String, Factory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `strategy` under `name`. Re-registering a name replaces
    /// the previous entry with a warning.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, strategy: F) -> &mut Self
    where
        F: Fn(StrategyCtx) -> Fut + 'static,
        Fut: Future<Output = StrategyResult> + 'static,
    {
        let name = name.into();
        let factory: Factory = Rc::new(move |ctx| strategy(ctx).boxed_local());
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(strategy = %name, "strategy re-registered, replacing previous entry");
        } else {
            info!(strategy = %name, "registered strategy");
        }
        self
    }

    /// The registered names, in deterministic (sorted) order.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Builds a fresh run of `name`, if registered.
    pub(crate) fn build(
        &self,
        name: &str,
        ctx: StrategyCtx,
    ) -> Option<LocalBoxFuture<'static, StrategyResult>> {
        self.factories.get(name).map(|factory| factory(ctx))
    }
}
