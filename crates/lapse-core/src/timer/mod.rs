// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The timer contract and the start/stop state machine shared by all backends.
//!
//! A timer has two states, stopped (initial) and started. Each start/stop
//! cycle *replaces* the previously recorded value: a timer holds a single
//! measurement, the last one to complete. Cumulative multi-stage totals are
//! expressed with several timers in a [`crate::TimerPool`], not by restarting
//! one timer.

pub mod device;
pub mod host;
pub mod scoped;
pub mod stopwatch;

use crate::error::{TimerError, TimerResult};

/// The capability set every timer exposes, regardless of its clock source.
///
/// Timers own their clock resources exclusively and are never `Clone`.
pub trait Timer {
    /// Transitions from stopped to started and begins measuring from "now".
    ///
    /// Returns [`TimerError::AlreadyStarted`] if the timer is running; the
    /// value of the previous measurement is kept in that case.
    fn start(&mut self) -> TimerResult<()>;

    /// Transitions from started to stopped and makes the measurement authoritative.
    ///
    /// Stopping a stopped timer is a no-op.
    fn stop(&mut self) -> TimerResult<()>;

    /// Elapsed time in seconds.
    ///
    /// While started this is a live value computed on demand without changing
    /// any state. While stopped it is the last completed measurement.
    fn elapsed(&self) -> TimerResult<f64>;

    /// Returns `true` if the timer is not measuring.
    fn is_stopped(&self) -> bool;

    /// Amount of data (bytes, elements, ...) processed by the timed work; 0 if unused.
    fn data_size(&self) -> usize;

    /// Unit of [`Timer::data_size`]; empty if no throughput should be derived.
    fn unit(&self) -> &str;

    /// A short label naming the clock source, e.g. `"host"` or `"device"`.
    fn type_label(&self) -> &'static str;
}

/// Computes `data_size / elapsed`, in `unit` per second.
///
/// Returns `None` if the timer has no unit, no data size, or no positive elapsed time.
pub fn throughput(timer: &dyn Timer) -> Option<f64> {
    if timer.unit().is_empty() || timer.data_size() == 0 {
        return None;
    }
    timer
        .elapsed()
        .ok()
        .and_then(|secs| throughput_of(timer.data_size(), timer.unit(), secs))
}

/// Computes `data_size / secs` for an elapsed value read beforehand.
///
/// Same rules as [`throughput`], without reading the timer again.
pub fn throughput_of(data_size: usize, unit: &str, secs: f64) -> Option<f64> {
    if unit.is_empty() || data_size == 0 || secs <= 0.0 {
        return None;
    }
    Some(data_size as f64 / secs)
}

/// The clock-specific half of a timer.
///
/// Implementations only deal with their clock source; the surrounding
/// [`MeasuredTimer`] owns the state machine and the recorded value.
pub trait TimerBackend {
    /// The label reported by [`Timer::type_label`].
    const TYPE_LABEL: &'static str;

    /// Starts a new measurement window.
    fn begin(&mut self) -> TimerResult<()>;

    /// Closes the current window and returns its duration in seconds.
    fn end(&mut self) -> TimerResult<f64>;

    /// Duration in seconds from the start of the current window until now.
    fn live(&self) -> TimerResult<f64>;
}

/// A timer built from a [`TimerBackend`] and the shared state machine.
#[derive(Debug)]
pub struct MeasuredTimer<B: TimerBackend> {
    backend: B,
    // `None` only after a failed `end()`.
    elapsed: Option<f64>,
    started: bool,
    ever_started: bool,
    data_size: usize,
    unit: String,
}

impl<B: TimerBackend> MeasuredTimer<B> {
    /// Wraps a backend into a stopped timer.
    pub fn from_backend(backend: B, data_size: usize, unit: impl Into<String>) -> Self {
        Self {
            backend,
            elapsed: Some(0.0),
            started: false,
            ever_started: false,
            data_size,
            unit: unit.into(),
        }
    }

    /// Returns `true` once the timer has been started at least once.
    pub fn has_run(&self) -> bool {
        self.ever_started
    }

    /// Returns a reference to the clock backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: TimerBackend> Timer for MeasuredTimer<B> {
    fn start(&mut self) -> TimerResult<()> {
        if self.started {
            log::error!(
                "[{} timer] start() called while already started; keeping the running window",
                B::TYPE_LABEL
            );
            return Err(TimerError::AlreadyStarted);
        }
        self.backend.begin()?;
        self.started = true;
        self.ever_started = true;
        log::trace!("[{} timer] started", B::TYPE_LABEL);
        Ok(())
    }

    fn stop(&mut self) -> TimerResult<()> {
        if !self.started {
            if !self.ever_started {
                log::warn!(
                    "[{} timer] stop() called on a timer that was never started",
                    B::TYPE_LABEL
                );
            }
            return Ok(());
        }
        self.started = false;
        match self.backend.end() {
            Ok(secs) => {
                // Clock sources are monotonic; clamp in case a device reports reordered ticks.
                self.elapsed = Some(secs.max(0.0));
                log::trace!("[{} timer] stopped after {:.6}s", B::TYPE_LABEL, secs);
                Ok(())
            }
            Err(e) => {
                self.elapsed = None;
                Err(e)
            }
        }
    }

    fn elapsed(&self) -> TimerResult<f64> {
        if self.started {
            self.backend.live().map(|secs| secs.max(0.0))
        } else {
            self.elapsed.ok_or(TimerError::Unavailable)
        }
    }

    fn is_stopped(&self) -> bool {
        !self.started
    }

    fn data_size(&self) -> usize {
        self.data_size
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn type_label(&self) -> &'static str {
        B::TYPE_LABEL
    }
}
