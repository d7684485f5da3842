//! The top-level scheduler.
//!
//! One executor drains one host event stream on one thread. Strategies are
//! stepped, never spawned: after each event is offered, every matched task
//! runs synchronously to its next suspension point before the next event is
//! taken, so the schedule is a pure function of the event order.

use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use host_core::{Event, Host, Interrupt};
use metrics::SharedMetrics;
use tracing::{debug, error, info, warn};

use crate::atexit::execute_atexit;
use crate::error::EngineError;
use crate::registry::StrategyRegistry;
use crate::router;
use crate::task::{StepOutcome, StrategyCtx, StrategyTask, TaskShared};

/// Tunables for the executor. The defaults are the contract; tests shrink
/// them.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Minimum spacing between restart attempts of one strategy.
    pub restart_throttle: Duration,
    /// How long `clear_strategies` lets cleanup handlers run.
    pub shutdown_window: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            restart_throttle: Duration::from_secs(1),
            shutdown_window: Duration::from_millis(5_000),
        }
    }
}

struct StrategySlot {
    name: String,
    ctx: StrategyCtx,
    task: StrategyTask,
}

struct CleanupSlot {
    name: String,
    task: StrategyTask,
    restart_after: bool,
}

struct PendingRestart {
    name: String,
    due: Instant,
}

/// Loads strategies, pumps host events, dispatches to strategy tasks,
/// restarts failed strategies, and coordinates shutdown.
pub struct Executor {
    host: Rc<dyn Host>,
    registry: StrategyRegistry,
    metrics: SharedMetrics,
    config: ExecutorConfig,
    strategies: Vec<StrategySlot>,
    cleanups: Vec<CleanupSlot>,
    pending_restarts: Vec<PendingRestart>,
}

impl Executor {
    pub fn new(host: Rc<dyn Host>, registry: StrategyRegistry, metrics: SharedMetrics) -> Self {
        Self::with_config(host, registry, metrics, ExecutorConfig::default())
    }

    pub fn with_config(
        host: Rc<dyn Host>,
        registry: StrategyRegistry,
        metrics: SharedMetrics,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            host,
            registry,
            metrics,
            config,
            strategies: Vec::new(),
            cleanups: Vec::new(),
            pending_restarts: Vec::new(),
        }
    }

    /// Runs until terminated.
    ///
    /// A `Restart` interrupt tears every strategy down through
    /// [`Self::clear_strategies`] and reloads the registry from scratch;
    /// `Terminate` does the teardown and returns.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        loop {
            self.startup()?;
            let interrupt = self.event_loop().await?;
            self.clear_strategies().await;
            match interrupt {
                Interrupt::Terminate => {
                    info!("executor terminated");
                    return Ok(());
                }
                Interrupt::Restart => {
                    info!("reloading all strategies");
                }
            }
        }
    }

    /// Loads every registered strategy and runs it to its first suspension.
    /// A failure at this point is fatal.
    fn startup(&mut self) -> Result<(), EngineError> {
        self.strategies.clear();
        self.cleanups.clear();
        self.pending_restarts.clear();

        for name in self.registry.names() {
            self.metrics.reset(&name);
            let mut slot = self.spawn(&name);
            match slot.task.step() {
                StepOutcome::Suspended => {
                    debug!(strategy = %name, "strategy loaded");
                    self.strategies.push(slot);
                }
                StepOutcome::Done => match slot.task.take_outcome().unwrap_or(Ok(())) {
                    Ok(()) => {
                        info!(strategy = %name, "strategy finished during startup");
                        self.begin_cleanup(slot, false);
                    }
                    Err(source) => {
                        return Err(EngineError::Startup {
                            strategy: name,
                            source: Box::new(source),
                        });
                    }
                },
            }
        }
        Ok(())
    }

    fn spawn(&self, name: &str) -> StrategySlot {
        let shared = TaskShared::new(name);
        let ctx = StrategyCtx::new(
            Rc::clone(&shared),
            Rc::clone(&self.host),
            Arc::clone(&self.metrics),
        );
        let future = self
            .registry
            .build(name, ctx.clone())
            .expect("spawned strategy is registered");
        StrategySlot {
            name: name.to_string(),
            ctx,
            task: StrategyTask::new(shared, future),
        }
    }

    /// Drains host events until an interrupt arrives.
    async fn event_loop(&mut self) -> Result<Interrupt, EngineError> {
        loop {
            let event = self.host.next_event().await;
            match self.dispatch(&event) {
                Ok(Some(interrupt)) => return Ok(interrupt),
                Ok(None) => {}
                Err(EngineError::Network) => {
                    warn!("transient network failure during dispatch");
                }
                Err(err) => {
                    error!(error = %err, "dispatch failed, aborting executor");
                    return Err(err);
                }
            }
            self.sweep();
        }
    }

    /// Offers one event: signals break the loop, fetcher payloads fan out
    /// to every router, and wants decide which tasks resume.
    fn dispatch(&mut self, event: &Event) -> Result<Option<Interrupt>, EngineError> {
        if let Some(interrupt) = event.as_signal() {
            info!(?interrupt, "signal received");
            return Ok(Some(interrupt));
        }

        if let Event::Fetcher(payload) = event {
            if payload.error {
                error!(
                    url = %payload.url,
                    status = payload.status,
                    "fetcher poll failed"
                );
                return Ok(None);
            }
            for slot in &self.strategies {
                router::deliver(&slot.ctx, payload);
            }
        }

        for slot in &mut self.strategies {
            if let Some(value) = slot.task.shared().offer(event) {
                slot.task.resume(value);
            }
        }
        for slot in &mut self.cleanups {
            if let Some(value) = slot.task.shared().offer(event) {
                slot.task.resume(value);
            }
        }
        Ok(None)
    }

    /// Reaps dead tasks, runs their cleanup, and brings restarts due.
    fn sweep(&mut self) {
        let mut running = Vec::new();
        for mut slot in std::mem::take(&mut self.strategies) {
            if !slot.task.is_done() {
                running.push(slot);
                continue;
            }
            let restart_after = match slot.task.take_outcome().unwrap_or(Ok(())) {
                Ok(()) => {
                    info!(strategy = %slot.name, "strategy finished cleanly");
                    false
                }
                Err(err) => {
                    error!(strategy = %slot.name, error = %err, "strategy failed");
                    true
                }
            };
            self.begin_cleanup(slot, restart_after);
        }
        self.strategies = running;

        let mut cleaning = Vec::new();
        for slot in std::mem::take(&mut self.cleanups) {
            if slot.task.is_done() {
                self.finalize_cleanup(slot);
            } else {
                cleaning.push(slot);
            }
        }
        self.cleanups = cleaning;

        let now = Instant::now();
        let due: Vec<String> = {
            let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_restarts)
                .into_iter()
                .partition(|restart| restart.due <= now);
            self.pending_restarts = later;
            due.into_iter().map(|restart| restart.name).collect()
        };
        for name in due {
            self.restart(&name);
        }
    }

    fn restart(&mut self, name: &str) {
        self.metrics.reset(name);
        self.metrics.for_strategy(name).inc_restarts();
        let mut slot = self.spawn(name);
        match slot.task.step() {
            StepOutcome::Suspended => {
                info!(strategy = %name, "strategy restarted");
                self.strategies.push(slot);
            }
            StepOutcome::Done => match slot.task.take_outcome().unwrap_or(Ok(())) {
                Ok(()) => {
                    info!(strategy = %name, "strategy finished right after restart");
                    self.begin_cleanup(slot, false);
                }
                Err(err) => {
                    error!(strategy = %name, error = %err, "restart failed");
                    self.begin_cleanup(slot, true);
                }
            },
        }
    }

    /// Replaces a finished strategy task with a task running its atexit
    /// handlers. The strategy's local store stays alive until the handlers
    /// are done.
    fn begin_cleanup(&mut self, slot: StrategySlot, restart_after: bool) {
        let StrategySlot { name, ctx, task } = slot;
        let shared = Rc::clone(task.shared());
        drop(task);
        shared.clear_want();

        let future = async move {
            execute_atexit(ctx).await;
            Ok(())
        }
        .boxed_local();
        let mut cleanup = CleanupSlot {
            name,
            task: StrategyTask::new(shared, future),
            restart_after,
        };
        if cleanup.task.step() == StepOutcome::Done {
            self.finalize_cleanup(cleanup);
        } else {
            self.cleanups.push(cleanup);
        }
    }

    /// Clears the dead strategy's local store and schedules its restart if
    /// it died with an error.
    fn finalize_cleanup(&mut self, mut slot: CleanupSlot) {
        if let Some(Err(err)) = slot.task.take_outcome() {
            warn!(strategy = %slot.name, error = %err, "cleanup task failed");
        }
        slot.task.shared().clear_want();
        slot.task.shared().clear_locals();
        debug!(strategy = %slot.name, "strategy state cleared");

        if slot.restart_after {
            self.pending_restarts.push(PendingRestart {
                name: slot.name,
                due: Instant::now() + self.config.restart_throttle,
            });
        }
    }

    /// Runs every live strategy's atexit handlers, concurrently against
    /// further host events, for at most the shutdown window.
    pub async fn clear_strategies(&mut self) {
        for slot in std::mem::take(&mut self.strategies) {
            self.begin_cleanup(slot, false);
        }
        self.pending_restarts.clear();

        if self.cleanups.is_empty() {
            return;
        }

        let deadline = tokio::time::Instant::now() + self.config.shutdown_window;
        while !self.cleanups.is_empty() {
            let event = match tokio::time::timeout_at(deadline, self.host.next_event()).await {
                Ok(event) => event,
                Err(_) => {
                    warn!(
                        abandoned = self.cleanups.len(),
                        "shutdown window elapsed before all cleanup handlers finished"
                    );
                    break;
                }
            };
            // Already shutting down: further signals and failed polls are
            // of no use to cleanup handlers.
            if event.as_signal().is_some() {
                continue;
            }
            for slot in &mut self.cleanups {
                if let Some(value) = slot.task.shared().offer(&event) {
                    slot.task.resume(value);
                }
            }
            let mut cleaning = Vec::new();
            for slot in std::mem::take(&mut self.cleanups) {
                if slot.task.is_done() {
                    self.finalize_cleanup(slot);
                } else {
                    cleaning.push(slot);
                }
            }
            self.cleanups = cleaning;
        }

        for slot in std::mem::take(&mut self.cleanups) {
            slot.task.shared().clear_want();
            slot.task.shared().clear_locals();
        }
        self.pending_restarts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::router::exit;
    use crate::sim::SimHost;
    use host_core::{RequestPayload, ResponsePayload, TransportError, TransportErrorKind};
    use model::Snapshot;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    const URL_A: &str = "https://sim.test/a";
    const URL_B: &str = "https://sim.test/b";
    const PERIOD: Duration = Duration::from_millis(100);

    fn raw_parse(payload: &ResponsePayload) -> Result<Snapshot, ParseError> {
        Ok(Snapshot::Raw(serde_json::from_str(&payload.content)?))
    }

    fn new_executor(host: &Rc<SimHost>, registry: StrategyRegistry) -> Executor {
        Executor::with_config(
            Rc::clone(host) as Rc<dyn Host>,
            registry,
            metrics::create_metrics(),
            ExecutorConfig {
                restart_throttle: Duration::ZERO,
                ..Default::default()
            },
        )
    }

    fn counting_strategy(
        registry: &mut StrategyRegistry,
        name: &str,
        urls: &'static [&'static str],
        calls: &Rc<Cell<u32>>,
    ) {
        let calls = Rc::clone(calls);
        registry.register(name, move |ctx| {
            let calls = Rc::clone(&calls);
            async move {
                for url in urls {
                    ctx.register(RequestPayload::get(*url), PERIOD, raw_parse);
                }
                ctx.on(move |_tick| {
                    let calls = Rc::clone(&calls);
                    async move {
                        calls.set(calls.get() + 1);
                        Ok(())
                    }
                })
                .await
            }
        });
    }

    #[tokio::test]
    async fn test_warmup_gate_holds_with_one_subscription_cold() {
        let host = SimHost::new();
        let calls = Rc::new(Cell::new(0));
        let mut registry = StrategyRegistry::new();
        counting_strategy(&mut registry, "gate", &[URL_A, URL_B], &calls);

        host.push_fetcher(URL_A, "1");
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn test_warmup_gate_opens_once_every_subscription_primed() {
        let host = SimHost::new();
        let results_len = Rc::new(Cell::new(0usize));
        let calls = Rc::new(Cell::new(0u32));
        let mut registry = StrategyRegistry::new();
        {
            let results_len = Rc::clone(&results_len);
            let calls = Rc::clone(&calls);
            registry.register("gate", move |ctx| {
                let results_len = Rc::clone(&results_len);
                let calls = Rc::clone(&calls);
                async move {
                    ctx.register(RequestPayload::get(URL_A), PERIOD, raw_parse);
                    ctx.register(RequestPayload::get(URL_B), PERIOD, raw_parse);
                    ctx.on(move |tick| {
                        let results_len = Rc::clone(&results_len);
                        let calls = Rc::clone(&calls);
                        async move {
                            calls.set(calls.get() + 1);
                            results_len.set(tick.results.len());
                            Ok(())
                        }
                    })
                    .await
                }
            });
        }

        host.push_fetcher(URL_A, "1");
        host.push_fetcher(URL_B, "2");
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(results_len.get(), 2);
    }

    #[tokio::test]
    async fn test_change_only_delivery_drops_identical_payloads() {
        let host = SimHost::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = StrategyRegistry::new();
        {
            let seen = Rc::clone(&seen);
            registry.register("dedup", move |ctx| {
                let seen = Rc::clone(&seen);
                async move {
                    let book = ctx.register(RequestPayload::get(URL_A), PERIOD, raw_parse);
                    ctx.on(move |tick| {
                        let seen = Rc::clone(&seen);
                        let book = book.clone();
                        async move {
                            // The changed extractor is the registered one
                            // and resolves to the stored value.
                            assert_eq!(tick.changed.id(), book.id());
                            assert_eq!(
                                tick.changed.value(&tick.results),
                                tick.results.get_by_id(book.id())
                            );
                            seen.borrow_mut()
                                .push(tick.results.get(&book).cloned().unwrap());
                            Ok(())
                        }
                    })
                    .await
                }
            });
        }

        let same = r#"{"bids":[["100","1"]]}"#;
        host.push_fetcher(URL_A, same);
        host.push_fetcher(URL_A, same);
        host.push_fetcher(URL_A, same);
        host.push_fetcher(URL_A, r#"{"bids":[["100","2"]]}"#);
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn test_send_round_trip_resumes_with_matching_response() {
        let host = SimHost::new();
        let observed = Rc::new(RefCell::new(None));
        let mut registry = StrategyRegistry::new();
        {
            let observed = Rc::clone(&observed);
            registry.register("sender", move |ctx| {
                let observed = Rc::clone(&observed);
                async move {
                    let value = ctx
                        .send_json(RequestPayload::post("https://sim.test/order", "{}"))
                        .await?;
                    *observed.borrow_mut() = Some(value);
                    Ok(())
                }
            });
        }

        host.push_send_response(
            1,
            ResponsePayload::from_http("https://sim.test/order", None, 200, r#"{"ok":1}"#),
        );
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert_eq!(*observed.borrow(), Some(json!({"ok": 1})));
        assert_eq!(host.sent_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_send_error_surfaces_transport_error() {
        let host = SimHost::new();
        let observed: Rc<RefCell<Option<TransportError>>> = Rc::new(RefCell::new(None));
        let mut registry = StrategyRegistry::new();
        {
            let observed = Rc::clone(&observed);
            registry.register("sender", move |ctx| {
                let observed = Rc::clone(&observed);
                async move {
                    match ctx.send(RequestPayload::post("X", "{}")).await {
                        Err(EngineError::Transport(err)) => {
                            *observed.borrow_mut() = Some(err);
                            Ok(())
                        }
                        other => panic!("expected a transport error, got {other:?}"),
                    }
                }
            });
        }

        host.push_send_response(1, ResponsePayload::from_http("X", None, 500, "boom"));
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        let err = observed.borrow_mut().take().unwrap();
        assert_eq!(err.kind, TransportErrorKind::HttpStatus(500));
        assert_eq!(err.url, "X");
        assert_eq!(err.status, 500);
        assert_eq!(err.content, "boom");
    }

    #[tokio::test]
    async fn test_send_ignores_foreign_tokens() {
        let host = SimHost::new();
        let completed = Rc::new(Cell::new(false));
        let mut registry = StrategyRegistry::new();
        {
            let completed = Rc::clone(&completed);
            registry.register("sender", move |ctx| {
                let completed = Rc::clone(&completed);
                async move {
                    let _ = ctx.send(RequestPayload::post("X", "{}")).await;
                    completed.set(true);
                    Ok(())
                }
            });
        }

        // A response for a token nobody was handed out: no resumption.
        host.push_send_response(99, ResponsePayload::from_http("X", None, 200, "{}"));
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert!(!completed.get());
    }

    #[tokio::test]
    async fn test_failed_strategy_restarts_with_fresh_identifiers() {
        let host = SimHost::new();
        let runs = Rc::new(Cell::new(0u32));
        let ids = Rc::new(RefCell::new(Vec::new()));
        let mut registry = StrategyRegistry::new();
        {
            let runs = Rc::clone(&runs);
            let ids = Rc::clone(&ids);
            registry.register("flaky", move |ctx| {
                let runs = Rc::clone(&runs);
                let ids = Rc::clone(&ids);
                async move {
                    runs.set(runs.get() + 1);
                    let attempt = runs.get();
                    let sub = ctx.register(RequestPayload::get(URL_A), PERIOD, raw_parse);
                    ids.borrow_mut().push(sub.id().get());
                    ctx.on(|_tick| async { Err(exit()) }).await?;
                    if attempt == 1 {
                        Err(EngineError::Internal("simulated failure".into()))
                    } else {
                        Ok(())
                    }
                }
            });
        }

        host.push_fetcher(URL_A, "1");
        host.push_fetcher(URL_A, "2");
        host.push_signal(Interrupt::Terminate);

        let metrics = metrics::create_metrics();
        let mut executor = Executor::with_config(
            Rc::clone(&host) as Rc<dyn Host>,
            registry,
            Arc::clone(&metrics),
            ExecutorConfig {
                restart_throttle: Duration::ZERO,
                ..Default::default()
            },
        );
        executor.run().await.unwrap();

        assert_eq!(runs.get(), 2);
        // Identifiers start over at 1 after the restart.
        assert_eq!(*ids.borrow(), vec![1, 1]);
        assert_eq!(metrics.snapshot("flaky").restarts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_strategies_honors_shutdown_window() {
        let host = SimHost::new();
        let fast_ran = Rc::new(Cell::new(false));
        let hung_done = Rc::new(Cell::new(false));
        let mut registry = StrategyRegistry::new();
        {
            let fast_ran = Rc::clone(&fast_ran);
            registry.register("fast", move |ctx| {
                let fast_ran = Rc::clone(&fast_ran);
                async move {
                    ctx.atexit(move |_ctx| {
                        let fast_ran = Rc::clone(&fast_ran);
                        async move {
                            fast_ran.set(true);
                            Ok(())
                        }
                    });
                    // Suspend forever: no subscriptions means no changes.
                    ctx.on(|_tick| async { Ok(()) }).await
                }
            });
        }
        {
            let hung_done = Rc::clone(&hung_done);
            registry.register("hung", move |ctx| {
                let hung_done = Rc::clone(&hung_done);
                async move {
                    ctx.atexit(move |ctx| {
                        let hung_done = Rc::clone(&hung_done);
                        async move {
                            // This send is never answered.
                            ctx.send(RequestPayload::post("https://sim.test/cancel", "{}"))
                                .await?;
                            hung_done.set(true);
                            Ok(())
                        }
                    });
                    ctx.on(|_tick| async { Ok(()) }).await
                }
            });
        }

        host.push_signal(Interrupt::Terminate);

        let started = tokio::time::Instant::now();
        new_executor(&host, registry).run().await.unwrap();
        let elapsed = started.elapsed();

        assert!(fast_ran.get());
        assert!(!hung_done.get());
        assert!(elapsed >= Duration::from_millis(5_000), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(6_000), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_restart_signal_reloads_every_strategy() {
        let host = SimHost::new();
        let runs = Rc::new(Cell::new(0u32));
        let mut registry = StrategyRegistry::new();
        {
            let runs = Rc::clone(&runs);
            registry.register("reloaded", move |ctx| {
                let runs = Rc::clone(&runs);
                async move {
                    runs.set(runs.get() + 1);
                    ctx.on(|_tick| async { Ok(()) }).await
                }
            });
        }

        host.push_signal(Interrupt::Restart);
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[tokio::test]
    async fn test_strategies_share_an_event_but_not_state() {
        let host = SimHost::new();
        let calls_one = Rc::new(Cell::new(0));
        let calls_two = Rc::new(Cell::new(0));
        let mut registry = StrategyRegistry::new();
        counting_strategy(&mut registry, "one", &[URL_A], &calls_one);
        counting_strategy(&mut registry, "two", &[URL_A], &calls_two);

        host.push_fetcher(URL_A, "1");
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        // The same fetcher payload reached both strategies independently.
        assert_eq!(calls_one.get(), 1);
        assert_eq!(calls_two.get(), 1);
        // Both strategies polled the endpoint under their own registration.
        assert_eq!(host.subscriptions().len(), 2);
    }

    #[tokio::test]
    async fn test_errored_fetcher_payloads_are_dropped() {
        let host = SimHost::new();
        let calls = Rc::new(Cell::new(0));
        let mut registry = StrategyRegistry::new();
        counting_strategy(&mut registry, "resilient", &[URL_A], &calls);

        host.push_fetcher_error(URL_A, 502, "bad gateway");
        host.push_fetcher(URL_A, "1");
        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_removed_atexit_handler_does_not_run() {
        let host = SimHost::new();
        let removed_ran = Rc::new(Cell::new(false));
        let kept_ran = Rc::new(Cell::new(false));
        let mut registry = StrategyRegistry::new();
        {
            let removed_ran = Rc::clone(&removed_ran);
            let kept_ran = Rc::clone(&kept_ran);
            registry.register("tidy", move |ctx| {
                let removed_ran = Rc::clone(&removed_ran);
                let kept_ran = Rc::clone(&kept_ran);
                async move {
                    let key = ctx.atexit(move |_ctx| {
                        let removed_ran = Rc::clone(&removed_ran);
                        async move {
                            removed_ran.set(true);
                            Ok(())
                        }
                    });
                    ctx.atexit(move |_ctx| {
                        let kept_ran = Rc::clone(&kept_ran);
                        async move {
                            kept_ran.set(true);
                            Ok(())
                        }
                    });
                    assert!(ctx.remove_atexit(key));
                    Ok(())
                }
            });
        }

        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert!(!removed_ran.get());
        assert!(kept_ran.get());
    }

    #[tokio::test]
    async fn test_reregistration_returns_the_original_subscription() {
        let host = SimHost::new();
        let ids = Rc::new(RefCell::new(Vec::new()));
        let mut registry = StrategyRegistry::new();
        {
            let ids = Rc::clone(&ids);
            registry.register("idempotent", move |ctx| {
                let ids = Rc::clone(&ids);
                async move {
                    let first = ctx.register(RequestPayload::get(URL_A), PERIOD, raw_parse);
                    let second = ctx.register(RequestPayload::get(URL_A), PERIOD, raw_parse);
                    let other = ctx.register(RequestPayload::get(URL_B), PERIOD, raw_parse);
                    ids.borrow_mut().extend([
                        first.id().get(),
                        second.id().get(),
                        other.id().get(),
                    ]);
                    Ok(())
                }
            });
        }

        host.push_signal(Interrupt::Terminate);

        new_executor(&host, registry).run().await.unwrap();
        assert_eq!(*ids.borrow(), vec![1, 1, 2]);
        // The duplicate registration did not create a second poller request.
        assert_eq!(host.subscriptions().len(), 2);
    }
}
