//! Per-strategy runtime metrics.
//!
//! The executor resets a strategy's metrics when (re)loading it and reports
//! callback timings after every user-callback invocation. Counters are
//! plain atomics; timing aggregates sit behind a lock because they are
//! `Decimal`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// Metrics for a single strategy.
#[derive(Debug, Default)]
pub struct StrategyMetrics {
    callbacks: AtomicU64,
    parse_errors: AtomicU64,
    warn_logs: AtomicU64,
    error_logs: AtomicU64,
    restarts: AtomicU64,
    timings: RwLock<TimingStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TimingStats {
    samples: u64,
    total_cooperative_ms: Decimal,
    max_cooperative_ms: Decimal,
    total_wall_ms: Decimal,
    max_wall_ms: Decimal,
}

impl StrategyMetrics {
    pub fn inc_callbacks(&self) {
        self.callbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parse_errors(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_warn_logs(&self) {
        self.warn_logs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_error_logs(&self) {
        self.error_logs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_restarts(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timings(&self, cooperative_ms: Decimal, wall_ms: Decimal) {
        let mut stats = self.timings.write();
        stats.samples += 1;
        stats.total_cooperative_ms += cooperative_ms;
        stats.total_wall_ms += wall_ms;
        stats.max_cooperative_ms = stats.max_cooperative_ms.max(cooperative_ms);
        stats.max_wall_ms = stats.max_wall_ms.max(wall_ms);
    }

    pub fn snapshot(&self, strategy: &str) -> MetricsSnapshot {
        let stats = self.timings.read().clone();
        MetricsSnapshot {
            strategy: strategy.to_string(),
            callbacks: self.callbacks.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            warn_logs: self.warn_logs.load(Ordering::Relaxed),
            error_logs: self.error_logs.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            timing_samples: stats.samples,
            avg_cooperative_ms: average(stats.total_cooperative_ms, stats.samples),
            max_cooperative_ms: stats.max_cooperative_ms,
            avg_wall_ms: average(stats.total_wall_ms, stats.samples),
            max_wall_ms: stats.max_wall_ms,
        }
    }

    fn reset(&self) {
        self.callbacks.store(0, Ordering::Relaxed);
        self.parse_errors.store(0, Ordering::Relaxed);
        self.warn_logs.store(0, Ordering::Relaxed);
        self.error_logs.store(0, Ordering::Relaxed);
        // Restarts survive a reset: they count lifetime reloads.
        *self.timings.write() = TimingStats::default();
    }
}

fn average(total: Decimal, samples: u64) -> Decimal {
    if samples == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(samples)
    }
}

/// Registry of per-strategy metrics.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    strategies: DashMap<String, Arc<StrategyMetrics>>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// The metrics handle for `strategy`, created on first use.
    pub fn for_strategy(&self, strategy: &str) -> Arc<StrategyMetrics> {
        self.strategies
            .entry(strategy.to_string())
            .or_default()
            .clone()
    }

    /// Reset a strategy's counters and timing aggregates. Called by the
    /// executor when the strategy is (re)loaded.
    pub fn reset(&self, strategy: &str) {
        self.for_strategy(strategy).reset();
    }

    /// Timing sink for the router's per-callback stopwatch.
    pub fn report_timings(&self, strategy: &str, cooperative_ms: Decimal, wall_ms: Decimal) {
        self.for_strategy(strategy)
            .record_timings(cooperative_ms, wall_ms);
    }

    pub fn snapshot(&self, strategy: &str) -> MetricsSnapshot {
        self.for_strategy(strategy).snapshot(strategy)
    }
}

/// Shared handle to the metrics registry.
pub type SharedMetrics = Arc<EngineMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(EngineMetrics::new())
}

/// A point-in-time view of one strategy's metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub strategy: String,
    pub callbacks: u64,
    pub parse_errors: u64,
    pub warn_logs: u64,
    pub error_logs: u64,
    pub restarts: u64,
    pub timing_samples: u64,
    pub avg_cooperative_ms: Decimal,
    pub max_cooperative_ms: Decimal,
    pub avg_wall_ms: Decimal,
    pub max_wall_ms: Decimal,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== {} ===", self.strategy)?;
        writeln!(f, "Callbacks:      {}", self.callbacks)?;
        writeln!(f, "Parse errors:   {}", self.parse_errors)?;
        writeln!(f, "Warn logs:      {}", self.warn_logs)?;
        writeln!(f, "Error logs:     {}", self.error_logs)?;
        writeln!(f, "Restarts:       {}", self.restarts)?;
        writeln!(
            f,
            "Cooperative ms: avg {:.3} max {:.3} ({} samples)",
            self.avg_cooperative_ms, self.max_cooperative_ms, self.timing_samples
        )?;
        writeln!(
            f,
            "Wall ms:        avg {:.3} max {:.3}",
            self.avg_wall_ms, self.max_wall_ms
        )
    }
}
