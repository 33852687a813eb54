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

//! Host-clock timer backend.

use super::stopwatch::Stopwatch;
use super::{MeasuredTimer, Timer, TimerBackend};
use crate::error::TimerResult;

/// Backend sampling the host's monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct HostClock {
    watch: Stopwatch,
}

impl TimerBackend for HostClock {
    const TYPE_LABEL: &'static str = "host";

    fn begin(&mut self) -> TimerResult<()> {
        self.watch.restart();
        Ok(())
    }

    fn end(&mut self) -> TimerResult<f64> {
        Ok(self.watch.elapsed_secs_f64().unwrap_or_default())
    }

    fn live(&self) -> TimerResult<f64> {
        Ok(self.watch.elapsed_secs_f64().unwrap_or_default())
    }
}

/// A timer measuring host (CPU-side) elapsed time.
pub type HostTimer = MeasuredTimer<HostClock>;

impl MeasuredTimer<HostClock> {
    /// Creates a host timer, started right away if `auto_start` is set.
    pub fn new(data_size: usize, unit: impl Into<String>, auto_start: bool) -> Self {
        let mut timer = Self::from_backend(HostClock::default(), data_size, unit);
        if auto_start {
            // Starting a fresh host timer cannot fail.
            let _ = timer.start();
        }
        timer
    }
}

impl Default for MeasuredTimer<HostClock> {
    fn default() -> Self {
        Self::new(0, "", false)
    }
}
