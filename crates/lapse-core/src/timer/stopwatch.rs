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

//! A monotonic host stopwatch.

use std::time::{Duration, Instant};

/// Measures host time from a monotonic [`Instant`], immune to wall-clock adjustments.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    start_time: Option<Instant>,
}

impl Stopwatch {
    /// Creates a stopwatch that starts counting immediately.
    /// ## Returns
    /// A running Stopwatch.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
        }
    }

    /// Creates a stopwatch that has not been started.
    #[inline]
    pub fn idle() -> Self {
        Self { start_time: None }
    }

    /// Restarts the stopwatch from "now".
    #[inline]
    pub fn restart(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Returns `true` if the stopwatch has a start time.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// Returns the elapsed time since the stopwatch was (re)started.
    /// ## Returns
    /// An Option containing the elapsed time as a Duration, or None if the stopwatch has never been started.
    #[inline]
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// Returns the elapsed time in whole milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed().map(|d| d.as_millis() as u64)
    }

    /// Returns the elapsed time in whole microseconds.
    #[inline]
    pub fn elapsed_us(&self) -> Option<u64> {
        self.elapsed().map(|d| d.as_micros() as u64)
    }

    /// Returns the elapsed time in seconds as f64.
    #[inline]
    pub fn elapsed_secs_f64(&self) -> Option<f64> {
        self.elapsed().map(|d| d.as_secs_f64())
    }
}
