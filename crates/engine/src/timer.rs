//! The per-strategy callback stopwatch.
//!
//! Measures two durations around each user callback: *cooperative* time
//! (time the strategy actually held the thread) and *wall* time. The send
//! helper pauses the stopwatch while the strategy is blocked waiting for a
//! response, so cooperative time excludes the wait while wall time keeps
//! counting.

use std::time::Instant;

use rust_decimal::Decimal;

use crate::error::EngineError;

/// Stopwatch states: `Stopped → Started ⇄ Paused → Stopped`.
///
/// Illegal transitions are no-ops, except stopping a stopped stopwatch,
/// which is an error.
#[derive(Debug, Default)]
pub struct Stopwatch {
    state: State,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Stopped,
    Started {
        wall_started: Instant,
        run_started: Instant,
        accumulated: Decimal,
    },
    Paused {
        wall_started: Instant,
        accumulated: Decimal,
    },
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh measurement, resetting any accumulated time.
    pub fn start(&mut self) {
        if matches!(self.state, State::Stopped) {
            let now = Instant::now();
            self.state = State::Started {
                wall_started: now,
                run_started: now,
                accumulated: Decimal::ZERO,
            };
        }
    }

    /// Stops accumulating cooperative time. Wall time keeps counting.
    pub fn pause(&mut self) {
        if let State::Started {
            wall_started,
            run_started,
            accumulated,
        } = self.state
        {
            self.state = State::Paused {
                wall_started,
                accumulated: accumulated + elapsed_ms(run_started),
            };
        }
    }

    /// Resumes accumulating cooperative time after a pause.
    pub fn resume(&mut self) {
        if let State::Paused {
            wall_started,
            accumulated,
        } = self.state
        {
            self.state = State::Started {
                wall_started,
                run_started: Instant::now(),
                accumulated,
            };
        }
    }

    /// Ends the measurement, returning `(cooperative_ms, wall_ms)`.
    pub fn stop(&mut self) -> Result<(Decimal, Decimal), EngineError> {
        match std::mem::take(&mut self.state) {
            State::Stopped => Err(EngineError::TimerStopped),
            State::Started {
                wall_started,
                run_started,
                accumulated,
            } => Ok((
                accumulated + elapsed_ms(run_started),
                elapsed_ms(wall_started),
            )),
            State::Paused {
                wall_started,
                accumulated,
            } => Ok((accumulated, elapsed_ms(wall_started))),
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, State::Stopped)
    }
}

fn elapsed_ms(since: Instant) -> Decimal {
    Decimal::try_from(since.elapsed().as_nanos())
        .unwrap_or(Decimal::MAX)
        / Decimal::new(1_000_000, 0)
}
