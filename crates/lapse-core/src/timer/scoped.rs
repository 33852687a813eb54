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

//! Provides an RAII guard that stops a timer when its scope ends.

use super::Timer;
use crate::error::TimerResult;

/// Stops the bound timer exactly once, when the guard is dropped or when
/// [`ScopedTimerStop::stop`] is first called, whichever comes first.
///
/// The guard does not start the timer and does not own it. Because the stop
/// happens in `Drop`, it also runs on early returns, `?` propagation and panics.
pub struct ScopedTimerStop<'a, T: Timer + ?Sized> {
    timer: &'a mut T,
    stopped: bool,
}

impl<'a, T: Timer + ?Sized> ScopedTimerStop<'a, T> {
    /// Binds a guard to `timer`.
    pub fn new(timer: &'a mut T) -> Self {
        Self {
            timer,
            stopped: false,
        }
    }

    /// Stops the timer now. Later calls, and the eventual drop, do nothing.
    pub fn stop(&mut self) -> TimerResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.timer.stop()
    }

    /// Elapsed time of the bound timer, in seconds.
    pub fn elapsed(&self) -> TimerResult<f64> {
        self.timer.elapsed()
    }
}

impl<T: Timer + ?Sized> Drop for ScopedTimerStop<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("[ScopedTimerStop] Failed to stop timer: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimerError;
    use crate::timer::host::HostTimer;
    use std::panic::{self, AssertUnwindSafe};

    /// A host timer that counts how many times it was stopped while running.
    #[derive(Default)]
    struct CountingTimer {
        inner: HostTimer,
        effective_stops: usize,
    }

    impl Timer for CountingTimer {
        fn start(&mut self) -> TimerResult<()> {
            self.inner.start()
        }
        fn stop(&mut self) -> TimerResult<()> {
            if !self.inner.is_stopped() {
                self.effective_stops += 1;
            }
            self.inner.stop()
        }
        fn elapsed(&self) -> TimerResult<f64> {
            self.inner.elapsed()
        }
        fn is_stopped(&self) -> bool {
            self.inner.is_stopped()
        }
        fn data_size(&self) -> usize {
            0
        }
        fn unit(&self) -> &str {
            ""
        }
        fn type_label(&self) -> &'static str {
            "counting"
        }
    }

    fn timed_branch(timer: &mut CountingTimer, branch: u8) -> Result<u8, TimerError> {
        timer.start()?;
        let _guard = ScopedTimerStop::new(timer);
        if branch == 0 {
            return Ok(0);
        }
        if branch == 1 {
            return Err(TimerError::Unavailable);
        }
        let early: Option<u8> = None;
        early.ok_or(TimerError::UnknownTimer(2))?;
        Ok(3)
    }

    /// Every return path of a guarded function stops the timer exactly once.
    #[test]
    fn every_exit_path_stops_exactly_once() {
        for branch in 0..3 {
            let mut timer = CountingTimer::default();
            let _ = timed_branch(&mut timer, branch);
            assert!(timer.is_stopped(), "branch {branch} left the timer running");
            assert_eq!(timer.effective_stops, 1, "branch {branch}");
        }
    }

    /// Unwinding through the guard still stops the timer.
    #[test]
    fn panic_unwinding_stops_timer() {
        let mut timer = CountingTimer::default();
        timer.start().unwrap();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = ScopedTimerStop::new(&mut timer);
            panic!("simulated failure inside timed scope");
        }));
        assert!(result.is_err());
        assert!(timer.is_stopped());
        assert_eq!(timer.effective_stops, 1);
    }

    /// A manual stop is not repeated when the guard drops.
    #[test]
    fn manual_stop_then_drop_does_not_stop_twice() {
        let mut timer = CountingTimer::default();
        timer.start().unwrap();
        {
            let mut guard = ScopedTimerStop::new(&mut timer);
            guard.stop().unwrap();
            let frozen = guard.elapsed().unwrap();
            guard.stop().unwrap();
            assert_eq!(guard.elapsed().unwrap(), frozen);
        }
        assert_eq!(timer.effective_stops, 1);
    }

    /// The guard binds to `dyn Timer` as well as concrete timers.
    #[test]
    fn guard_works_through_trait_objects() {
        let mut timer = HostTimer::new(0, "", true);
        {
            let dyn_timer: &mut dyn Timer = &mut timer;
            let guard = ScopedTimerStop::new(dyn_timer);
            assert!(guard.elapsed().unwrap() >= 0.0);
        }
        assert!(timer.is_stopped());
    }
}
