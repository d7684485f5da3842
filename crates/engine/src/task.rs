//! Strategy contexts, suspension, and manually stepped tasks.

use std::cell::RefCell;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::task::noop_waker;
use futures::FutureExt;
use host_core::{Event, Host, RequestPayload, ResponsePayload};
use metrics::{SharedMetrics, StrategyMetrics};

use crate::atexit::{AtexitRegistry, Handler};
use crate::error::{EngineError, ParseError};
use crate::router;
use crate::send;
use crate::store::LocalStore;
use crate::timer::Stopwatch;

pub use crate::atexit::AtexitKey;

/// The payload a matched want hands back to the resumed task.
pub(crate) type Resume = Arc<ResponsePayload>;

/// Decides whether an event should resume the suspended task, and with
/// what payload.
pub(crate) type Want = Box<dyn Fn(&Event) -> Option<Resume>>;

/// State shared between a strategy's task, its context handles, and the
/// executor.
pub(crate) struct TaskShared {
    name: String,
    want: RefCell<Option<Want>>,
    resume: RefCell<Option<Resume>>,
    locals: RefCell<LocalStore>,
}

impl TaskShared {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            want: RefCell::new(None),
            resume: RefCell::new(None),
            locals: RefCell::new(LocalStore::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the registered want against `event`. On a match the want
    /// is cleared (wants are single-shot) and the payload returned.
    pub fn offer(&self, event: &Event) -> Option<Resume> {
        let matched = self.want.borrow().as_ref().and_then(|want| want(event));
        if matched.is_some() {
            self.want.borrow_mut().take();
        }
        matched
    }

    pub fn has_want(&self) -> bool {
        self.want.borrow().is_some()
    }

    pub fn clear_want(&self) {
        self.want.borrow_mut().take();
    }

    fn deposit(&self, value: Resume) {
        *self.resume.borrow_mut() = Some(value);
    }

    pub fn clear_locals(&self) {
        self.locals.borrow_mut().clear();
    }

    pub fn with_locals<R>(&self, f: impl FnOnce(&mut LocalStore) -> R) -> R {
        f(&mut self.locals.borrow_mut())
    }
}

/// A strategy's handle to the engine.
///
/// Everything a strategy does — registering subscriptions, running its main
/// loop, sending requests, registering cleanup — goes through its context.
/// Contexts are cheap to clone and only reach the owning strategy's state.
#[derive(Clone)]
pub struct StrategyCtx {
    shared: Rc<TaskShared>,
    host: Rc<dyn Host>,
    metrics: SharedMetrics,
}

impl StrategyCtx {
    pub(crate) fn new(shared: Rc<TaskShared>, host: Rc<dyn Host>, metrics: SharedMetrics) -> Self {
        Self {
            shared,
            host,
            metrics,
        }
    }

    /// The strategy's unique name.
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// The hosting platform.
    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub(crate) fn shared(&self) -> &Rc<TaskShared> {
        &self.shared
    }

    pub(crate) fn metrics(&self) -> Arc<StrategyMetrics> {
        self.metrics.for_strategy(self.name())
    }

    pub(crate) fn metrics_registry(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub(crate) fn with_locals<R>(&self, f: impl FnOnce(&mut LocalStore) -> R) -> R {
        self.shared.with_locals(f)
    }

    /// Suspends the task until an event satisfies `want`.
    ///
    /// The want is registered immediately; the returned future completes
    /// with the matched payload once the executor resumes the task.
    ///
    /// # Panics
    ///
    /// Panics if the strategy already has an outstanding want. That means a
    /// strategy awaited two engine primitives concurrently, which the
    /// cooperative model does not allow.
    pub(crate) fn suspend(
        &self,
        want: impl Fn(&Event) -> Option<Resume> + 'static,
    ) -> impl Future<Output = Resume> {
        {
            let mut slot = self.shared.want.borrow_mut();
            assert!(
                slot.is_none(),
                "strategy '{}' already has an outstanding want",
                self.name()
            );
            *slot = Some(Box::new(want));
        }
        Suspend {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Registers a polled subscription. See [`router::register`].
    pub fn register(
        &self,
        request: RequestPayload,
        period: Duration,
        parse: impl Fn(&ResponsePayload) -> Result<model::Snapshot, ParseError> + 'static,
    ) -> router::Extractor {
        router::register(self, request, period, parse)
    }

    /// Runs the strategy's main loop. See [`router::on`].
    pub async fn on<F, Fut>(&self, callback: F) -> Result<(), EngineError>
    where
        F: FnMut(router::Tick) -> Fut,
        Fut: Future<Output = Result<(), EngineError>>,
    {
        router::on(self, callback).await
    }

    /// Issues an on-demand request and waits for its response. See
    /// [`send::send`].
    pub async fn send(&self, request: RequestPayload) -> Result<Arc<ResponsePayload>, EngineError> {
        send::send(self, request).await
    }

    /// Like [`Self::send`], decoding the response content as JSON.
    pub async fn send_json(
        &self,
        request: RequestPayload,
    ) -> Result<serde_json::Value, EngineError> {
        send::send_json(self, request).await
    }

    /// Registers a cleanup handler, returning its removal key.
    pub fn atexit<F, Fut>(&self, handler: F) -> AtexitKey
    where
        F: Fn(StrategyCtx) -> Fut + 'static,
        Fut: Future<Output = Result<(), EngineError>> + 'static,
    {
        let handler: Handler = Rc::new(move |ctx: StrategyCtx| handler(ctx).boxed_local());
        self.with_locals(|locals| locals.get_or_default::<AtexitRegistry>().add(handler))
    }

    /// Removes a previously registered cleanup handler.
    pub fn remove_atexit(&self, key: AtexitKey) -> bool {
        self.with_locals(|locals| {
            locals
                .get_mut::<AtexitRegistry>()
                .map(|registry| registry.remove(key))
                .unwrap_or(false)
        })
    }

    pub(crate) fn pause_timer(&self) {
        self.with_locals(|locals| {
            if let Some(stopwatch) = locals.get_mut::<Stopwatch>() {
                stopwatch.pause();
            }
        });
    }

    pub(crate) fn resume_timer(&self) {
        self.with_locals(|locals| {
            if let Some(stopwatch) = locals.get_mut::<Stopwatch>() {
                stopwatch.resume();
            }
        });
    }
}

/// The future returned by [`StrategyCtx::suspend`].
struct Suspend {
    shared: Rc<TaskShared>,
}

impl Future for Suspend {
    type Output = Resume;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.shared.resume.borrow_mut().take() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

/// What a single step of a task produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// The task suspended with a want registered.
    Suspended,
    /// The task reached a terminal state; its outcome is available.
    Done,
}

/// A manually stepped strategy task.
///
/// The executor polls the future directly with a noop waker: one step runs
/// the strategy synchronously until it suspends on a want or finishes.
/// Panics inside the strategy are caught and become task failures.
pub(crate) struct StrategyTask {
    shared: Rc<TaskShared>,
    future: Option<LocalBoxFuture<'static, Result<(), EngineError>>>,
    outcome: Option<Result<(), EngineError>>,
}

impl StrategyTask {
    pub fn new(
        shared: Rc<TaskShared>,
        future: LocalBoxFuture<'static, Result<(), EngineError>>,
    ) -> Self {
        Self {
            shared,
            future: Some(future),
            outcome: None,
        }
    }

    pub fn shared(&self) -> &Rc<TaskShared> {
        &self.shared
    }

    /// Runs the task to its next suspension point or completion.
    pub fn step(&mut self) -> StepOutcome {
        let Some(future) = self.future.as_mut() else {
            return StepOutcome::Done;
        };

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        match catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx))) {
            Ok(Poll::Pending) => {
                if self.shared.has_want() {
                    StepOutcome::Suspended
                } else {
                    // Suspended on something the executor can never wake.
                    self.finish(Err(EngineError::WantsNothing))
                }
            }
            Ok(Poll::Ready(result)) => self.finish(result),
            Err(_) => self.finish(Err(EngineError::Internal(format!(
                "strategy '{}' panicked",
                self.shared.name()
            )))),
        }
    }

    /// Deposits the resume value for a matched want and steps the task.
    pub fn resume(&mut self, value: Resume) -> StepOutcome {
        self.shared.deposit(value);
        self.step()
    }

    fn finish(&mut self, result: Result<(), EngineError>) -> StepOutcome {
        self.future = None;
        self.shared.clear_want();
        self.outcome = Some(result);
        StepOutcome::Done
    }

    pub fn is_done(&self) -> bool {
        self.future.is_none()
    }

    pub fn take_outcome(&mut self) -> Option<Result<(), EngineError>> {
        self.outcome.take()
    }
}
