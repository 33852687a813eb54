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

//! Device-clock timer backend.
//!
//! Device timers read the accelerator's own timestamps instead of sampling the
//! host clock, so the measured window is the one the device executed rather
//! than the one the host observed after synchronization. The accelerator API is
//! abstracted behind [`DeviceClock`]; concrete clocks live in backend crates.

use super::{MeasuredTimer, Timer, TimerBackend};
use crate::error::{TimerError, TimerResult};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

/// An accelerator timestamp facility.
///
/// Events are timestamp markers exclusively owned by one timer. They release
/// their device resources when dropped, whether or not they were ever recorded.
pub trait DeviceClock {
    /// A timestamp marker handle.
    type Event;

    /// Allocates a new, unrecorded event.
    ///
    /// Fails with [`TimerError::BackendUnavailable`] if the device cannot time work.
    fn create_event(&self) -> TimerResult<Self::Event>;

    /// Enqueues a timestamp write for `event` on the device's default queue.
    fn record(&self, event: &Self::Event) -> TimerResult<()>;

    /// Blocks the calling thread until `event` has been written by the device.
    fn synchronize(&self, event: &Self::Event) -> TimerResult<()>;

    /// Seconds elapsed between two recorded and synchronized events.
    fn elapsed_between(&self, begin: &Self::Event, end: &Self::Event) -> TimerResult<f64>;
}

/// A clock for hosts without an accelerator. Every event allocation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeviceClock;

impl DeviceClock for NoDeviceClock {
    type Event = Infallible;

    fn create_event(&self) -> TimerResult<Self::Event> {
        Err(TimerError::BackendUnavailable(
            "no device clock configured".to_owned(),
        ))
    }

    fn record(&self, event: &Self::Event) -> TimerResult<()> {
        match *event {}
    }

    fn synchronize(&self, event: &Self::Event) -> TimerResult<()> {
        match *event {}
    }

    fn elapsed_between(&self, begin: &Self::Event, _end: &Self::Event) -> TimerResult<f64> {
        match *begin {}
    }
}

/// Backend recording begin/end markers on a [`DeviceClock`].
///
/// A third `probe` marker serves live queries while the timer runs, so reading
/// elapsed time never touches the end marker of the window.
pub struct DeviceBackend<C: DeviceClock> {
    clock: Arc<C>,
    begin: C::Event,
    end: C::Event,
    probe: C::Event,
}

impl<C: DeviceClock> DeviceBackend<C> {
    /// Allocates the three markers of a timer on `clock`.
    pub fn new(clock: Arc<C>) -> TimerResult<Self> {
        let begin = clock.create_event()?;
        let end = clock.create_event()?;
        let probe = clock.create_event()?;
        Ok(Self {
            clock,
            begin,
            end,
            probe,
        })
    }

    /// Returns the clock this backend records on.
    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }
}

impl<C: DeviceClock> fmt::Debug for DeviceBackend<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBackend").finish_non_exhaustive()
    }
}

impl<C: DeviceClock> TimerBackend for DeviceBackend<C> {
    const TYPE_LABEL: &'static str = "device";

    fn begin(&mut self) -> TimerResult<()> {
        self.clock.record(&self.begin)
    }

    fn end(&mut self) -> TimerResult<f64> {
        self.clock.record(&self.end)?;
        self.clock.synchronize(&self.end)?;
        self.clock.elapsed_between(&self.begin, &self.end)
    }

    // Best effort: waits for the probe, which sits behind any work already queued.
    fn live(&self) -> TimerResult<f64> {
        self.clock.record(&self.probe)?;
        self.clock.synchronize(&self.probe)?;
        self.clock.elapsed_between(&self.begin, &self.probe)
    }
}

/// A timer measuring elapsed time on the accelerator.
///
/// `stop()` blocks until the device has completed the marked window.
pub type DeviceTimer<C> = MeasuredTimer<DeviceBackend<C>>;

impl<C: DeviceClock> MeasuredTimer<DeviceBackend<C>> {
    /// Creates a device timer on `clock`, started right away if `auto_start` is set.
    ///
    /// Fails with [`TimerError::BackendUnavailable`] if the clock cannot allocate markers.
    pub fn new(
        clock: Arc<C>,
        data_size: usize,
        unit: impl Into<String>,
        auto_start: bool,
    ) -> TimerResult<Self> {
        let backend = DeviceBackend::new(clock)?;
        let mut timer = Self::from_backend(backend, data_size, unit);
        if auto_start {
            timer.start()?;
        }
        log::debug!("Created device timer (auto_start: {auto_start})");
        Ok(timer)
    }
}
