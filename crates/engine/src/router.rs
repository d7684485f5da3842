//! The per-strategy router: subscriptions, change detection, and the main
//! loop.
//!
//! A strategy registers each endpoint it cares about, then hands its main
//! loop to [`on`]. The router parses incoming payloads, drops values that
//! compare equal to what it already has, and only invokes the user callback
//! once every subscription has produced at least one value (the warm-up
//! gate). Network pollers return the same payload over and over; dispatching
//! only on changes keeps strategy reactions deterministic.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

use host_core::{Event, Fingerprint, RequestPayload, ResponsePayload};
use model::Snapshot;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, ParseError};
use crate::task::{StrategyCtx, TaskShared};
use crate::timer::Stopwatch;

/// Cooperative time a single callback may take before a WARN is logged.
const COOPERATIVE_WARN_MS: i64 = 50;
/// Wall time (including blocking sends) before a WARN is logged.
const WALL_WARN_MS: i64 = 1500;

/// Identifies one subscription within a strategy. Assigned monotonically
/// from 1 at registration; restarts begin again at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type ParseFn = Rc<dyn Fn(&ResponsePayload) -> Result<Snapshot, ParseError>>;

struct Subscription {
    id: SubscriptionId,
    parse: ParseFn,
}

/// Router state, kept in the strategy-local store.
#[derive(Default)]
pub(crate) struct RouterState {
    next_id: u32,
    subscriptions: HashMap<Fingerprint, Subscription>,
    results: HashMap<SubscriptionId, Snapshot>,
    /// At most one pending payload per subscription; newer replaces older.
    pending: HashMap<Fingerprint, Arc<ResponsePayload>>,
    warm: bool,
}

/// Returns the last parsed value for one subscription from a results view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    id: SubscriptionId,
    fingerprint: Fingerprint,
}

impl Extractor {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// The last parsed value for this subscription, if any.
    pub fn value<'r>(&self, results: &'r Results) -> Option<&'r Snapshot> {
        results.get_by_id(self.id)
    }
}

/// An immutable view of the results table handed to user callbacks.
#[derive(Clone)]
pub struct Results {
    inner: Rc<HashMap<SubscriptionId, Snapshot>>,
}

impl Results {
    pub fn get(&self, extractor: &Extractor) -> Option<&Snapshot> {
        self.inner.get(&extractor.id)
    }

    pub fn get_by_id(&self, id: SubscriptionId) -> Option<&Snapshot> {
        self.inner.get(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// One meaningful change, as seen by the user callback.
#[derive(Clone)]
pub struct Tick {
    /// The full results table at the time of the change.
    pub results: Results,
    /// The subscription whose value just changed.
    pub changed: Extractor,
}

/// The sentinel a callback returns to unwind its main loop normally.
pub fn exit() -> EngineError {
    EngineError::Exit
}

/// Registers a polled subscription.
///
/// Idempotent on the request's fingerprint: re-registering returns the
/// extractor of the original registration. A fresh registration assigns the
/// next identifier and asks the host to poll `request` every `period`.
pub(crate) fn register(
    ctx: &StrategyCtx,
    request: RequestPayload,
    period: Duration,
    parse: impl Fn(&ResponsePayload) -> Result<Snapshot, ParseError> + 'static,
) -> Extractor {
    let fingerprint = request.fingerprint();
    let (extractor, fresh) = ctx.with_locals(|locals| {
        let state = locals.get_or_default::<RouterState>();
        match state.subscriptions.get(&fingerprint) {
            Some(existing) => (
                Extractor {
                    id: existing.id,
                    fingerprint: fingerprint.clone(),
                },
                false,
            ),
            None => {
                state.next_id += 1;
                let id = SubscriptionId(state.next_id);
                state.subscriptions.insert(
                    fingerprint.clone(),
                    Subscription {
                        id,
                        parse: Rc::new(parse),
                    },
                );
                (Extractor {
                    id,
                    fingerprint: fingerprint.clone(),
                }, true)
            }
        }
    });

    if fresh {
        debug!(
            strategy = %ctx.name(),
            fingerprint = %extractor.fingerprint,
            id = %extractor.id,
            period_ms = period.as_millis() as u64,
            "registered subscription"
        );
        ctx.host().subscribe(request, period);
    }
    extractor
}

/// Buffers a fetcher payload for this strategy if its fingerprint is
/// registered. Called by the executor while fanning an event out.
pub(crate) fn deliver(ctx: &StrategyCtx, payload: &Arc<ResponsePayload>) {
    let fingerprint = payload.fingerprint();
    ctx.with_locals(|locals| {
        let Some(state) = locals.get_mut::<RouterState>() else {
            return;
        };
        if state.subscriptions.contains_key(&fingerprint) {
            state.pending.insert(fingerprint, Arc::clone(payload));
        }
    });
}

/// The strategy's main loop.
///
/// Invokes `callback` exactly once per meaningful change, after every
/// registered subscription has produced at least one parsed value. A
/// callback returning the [`exit`] sentinel ends the loop normally; any
/// other error is logged and the loop continues.
pub(crate) async fn on<F, Fut>(ctx: &StrategyCtx, mut callback: F) -> Result<(), EngineError>
where
    F: FnMut(Tick) -> Fut,
    Fut: Future<Output = Result<(), EngineError>>,
{
    info!(strategy = %ctx.name(), "entering main loop");
    loop {
        let tick = next_change(ctx).await;

        let warm = ctx.with_locals(|locals| {
            let state = locals.get_or_default::<RouterState>();
            if !state.warm {
                state.warm = state
                    .subscriptions
                    .values()
                    .all(|sub| state.results.contains_key(&sub.id));
            }
            state.warm
        });
        if !warm {
            continue;
        }

        ctx.with_locals(|locals| locals.get_or_default::<Stopwatch>().start());
        ctx.metrics().inc_callbacks();

        let outcome = callback(tick).await;

        match ctx.with_locals(|locals| locals.get_or_default::<Stopwatch>().stop()) {
            Ok((cooperative_ms, wall_ms)) => {
                ctx.metrics_registry()
                    .report_timings(ctx.name(), cooperative_ms, wall_ms);
                if cooperative_ms > Decimal::from(COOPERATIVE_WARN_MS) {
                    ctx.metrics().inc_warn_logs();
                    warn!(
                        strategy = %ctx.name(),
                        cooperative_ms = %cooperative_ms,
                        "slow strategy callback"
                    );
                }
                if wall_ms > Decimal::from(WALL_WARN_MS) {
                    ctx.metrics().inc_warn_logs();
                    warn!(
                        strategy = %ctx.name(),
                        wall_ms = %wall_ms,
                        "strategy callback blocked too long"
                    );
                }
            }
            Err(err) => warn!(strategy = %ctx.name(), error = %err, "callback stopwatch broken"),
        }

        match outcome {
            Ok(()) => {}
            Err(err) if err.is_exit() => {
                info!(strategy = %ctx.name(), "main loop exited");
                return Ok(());
            }
            Err(err) => {
                ctx.metrics().inc_error_logs();
                error!(strategy = %ctx.name(), error = %err, "strategy callback failed");
            }
        }
    }
}

/// Waits for the next payload whose parsed value differs from the stored
/// one, updates the results table, and returns the change.
async fn next_change(ctx: &StrategyCtx) -> Tick {
    loop {
        // Prefer a buffered payload; otherwise suspend until one arrives.
        let taken = ctx.with_locals(|locals| {
            let state = locals.get_or_default::<RouterState>();
            let key = state.pending.keys().next().cloned()?;
            let payload = state.pending.remove(&key)?;
            Some((key, payload))
        });
        let (fingerprint, payload) = match taken {
            Some(taken) => taken,
            None => {
                let payload = ctx.suspend(registered_fetcher_want(ctx.shared())).await;
                let fingerprint = payload.fingerprint();
                // The executor buffered this payload before resuming us;
                // consume it so it is not dispatched twice.
                ctx.with_locals(|locals| {
                    locals
                        .get_or_default::<RouterState>()
                        .pending
                        .remove(&fingerprint);
                });
                (fingerprint, payload)
            }
        };

        let Some((id, parse)) = ctx.with_locals(|locals| {
            locals
                .get_or_default::<RouterState>()
                .subscriptions
                .get(&fingerprint)
                .map(|sub| (sub.id, Rc::clone(&sub.parse)))
        }) else {
            warn!(strategy = %ctx.name(), %fingerprint, "payload for unregistered fingerprint");
            continue;
        };

        let parsed = match catch_unwind(AssertUnwindSafe(|| parse(&payload))) {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(err)) => {
                ctx.metrics().inc_parse_errors();
                ctx.metrics().inc_error_logs();
                error!(
                    strategy = %ctx.name(),
                    %fingerprint,
                    error = %err,
                    "cannot parse subscription payload"
                );
                continue;
            }
            Err(_) => {
                ctx.metrics().inc_parse_errors();
                ctx.metrics().inc_error_logs();
                error!(strategy = %ctx.name(), %fingerprint, "parse callback panicked");
                continue;
            }
        };

        let results = ctx.with_locals(|locals| {
            let state = locals.get_or_default::<RouterState>();
            if state.results.get(&id) == Some(&parsed) {
                None
            } else {
                state.results.insert(id, parsed);
                Some(Rc::new(state.results.clone()))
            }
        });
        if let Some(inner) = results {
            return Tick {
                results: Results { inner },
                changed: Extractor { id, fingerprint },
            };
        }
    }
}

/// Want predicate: any fetcher response whose fingerprint is registered
/// with this strategy's router.
fn registered_fetcher_want(
    shared: &Rc<TaskShared>,
) -> impl Fn(&Event) -> Option<Arc<ResponsePayload>> + 'static {
    let weak: Weak<TaskShared> = Rc::downgrade(shared);
    move |event| {
        let Event::Fetcher(payload) = event else {
            return None;
        };
        let shared = weak.upgrade()?;
        let fingerprint = payload.fingerprint();
        let registered = shared.with_locals(|locals| {
            locals
                .get::<RouterState>()
                .map(|state| state.subscriptions.contains_key(&fingerprint))
                .unwrap_or(false)
        });
        registered.then(|| Arc::clone(payload))
    }
}
