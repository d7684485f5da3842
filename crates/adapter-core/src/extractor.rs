//! Typed views over the router's untyped extractors.

use engine::{Extractor, Results, Tick};
use model::{Balances, OpenOrders, OrderBook, Positions, Snapshot};

/// An [`Extractor`] that projects the stored snapshot into one canonical
/// shape.
///
/// Adapters return these from their `subscribe_*` operations so strategies
/// read order books as order books instead of matching on [`Snapshot`]
/// variants.
#[derive(Debug, Clone)]
pub struct TypedExtractor<T: 'static> {
    inner: Extractor,
    project: for<'a> fn(&'a Snapshot) -> Option<&'a T>,
}

impl<T> TypedExtractor<T> {
    pub fn new(inner: Extractor, project: for<'a> fn(&'a Snapshot) -> Option<&'a T>) -> Self {
        Self { inner, project }
    }

    /// The last parsed value for this subscription, if it is present and
    /// has the projected shape.
    pub fn get<'r>(&self, results: &'r Results) -> Option<&'r T> {
        self.inner.value(results).and_then(self.project)
    }

    /// True if this subscription is the one that changed in `tick`.
    pub fn changed_in(&self, tick: &Tick) -> bool {
        tick.changed.id() == self.inner.id()
    }

    /// The untyped extractor underneath.
    pub fn raw(&self) -> &Extractor {
        &self.inner
    }
}

impl TypedExtractor<OrderBook> {
    pub fn order_book(inner: Extractor) -> Self {
        Self::new(inner, Snapshot::as_order_book)
    }
}

impl TypedExtractor<Balances> {
    pub fn balances(inner: Extractor) -> Self {
        Self::new(inner, Snapshot::as_balances)
    }
}

impl TypedExtractor<Positions> {
    pub fn positions(inner: Extractor) -> Self {
        Self::new(inner, Snapshot::as_positions)
    }
}

impl TypedExtractor<OpenOrders> {
    pub fn orders(inner: Extractor) -> Self {
        Self::new(inner, Snapshot::as_orders)
    }
}
