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

//! A pool of labeled timers spanning a profiling session.

pub mod report;

use crate::config::ReportConfig;
use crate::error::{TimerError, TimerResult};
use crate::timer::device::{DeviceClock, DeviceTimer, NoDeviceClock};
use crate::timer::host::HostTimer;
use crate::timer::scoped::ScopedTimerStop;
use crate::timer::Timer;
use report::Report;
use std::io::{self, Write};
use std::sync::Arc;

/// A handle to a timer owned by a [`TimerPool`].
///
/// Handles are plain indices into the pool that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(usize);

impl TimerId {
    /// Position of the record in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

struct TimerRecord {
    timer: Box<dyn Timer>,
    label: String,
    level: usize,
}

/// An ordered, leveled collection of owned timers and a reporting routine.
///
/// The pool is created by the orchestrating code and passed to whichever
/// stages need to register timers. Records are never removed; they live as
/// long as the pool. There is no internal locking: share a pool across
/// threads only behind your own synchronization.
///
/// Timers added with [`TimerPool::add_host_timer`] or
/// [`TimerPool::add_device_timer`] are started immediately and placed one
/// level below the most recently added timer that is still running.
pub struct TimerPool<C: DeviceClock = NoDeviceClock> {
    records: Vec<TimerRecord>,
    device: Option<Arc<C>>,
    config: ReportConfig,
}

impl TimerPool<NoDeviceClock> {
    /// Creates a pool that can only host-time work.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            device: None,
            config: ReportConfig::default(),
        }
    }
}

impl Default for TimerPool<NoDeviceClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DeviceClock + 'static> TimerPool<C> {
    /// Creates a pool whose device timers record on `clock`.
    pub fn with_device(clock: Arc<C>) -> Self {
        Self {
            records: Vec::new(),
            device: Some(clock),
            config: ReportConfig::default(),
        }
    }

    /// Replaces the text rendering settings.
    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the text rendering settings.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Returns `true` if device timers can be added.
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Adds and starts a host timer.
    pub fn add_host_timer(
        &mut self,
        label: impl Into<String>,
        data_size: usize,
        unit: impl Into<String>,
    ) -> TimerId {
        let level = self.next_level();
        self.add_host_timer_at(label, level, data_size, unit)
    }

    /// Adds and starts a host timer at an explicit nesting level.
    pub fn add_host_timer_at(
        &mut self,
        label: impl Into<String>,
        level: usize,
        data_size: usize,
        unit: impl Into<String>,
    ) -> TimerId {
        let timer = HostTimer::new(data_size, unit, true);
        self.push(label.into(), level, Box::new(timer))
    }

    /// Adds and starts a device timer.
    ///
    /// Fails with [`TimerError::BackendUnavailable`] if the pool has no device
    /// clock or the clock cannot allocate markers. Nothing is recorded then.
    pub fn add_device_timer(
        &mut self,
        label: impl Into<String>,
        data_size: usize,
        unit: impl Into<String>,
    ) -> TimerResult<TimerId> {
        let level = self.next_level();
        self.add_device_timer_at(label, level, data_size, unit)
    }

    /// Adds and starts a device timer at an explicit nesting level.
    pub fn add_device_timer_at(
        &mut self,
        label: impl Into<String>,
        level: usize,
        data_size: usize,
        unit: impl Into<String>,
    ) -> TimerResult<TimerId> {
        let clock = self.device.clone().ok_or_else(|| {
            TimerError::BackendUnavailable("timer pool has no device clock".to_owned())
        })?;
        let timer = DeviceTimer::new(clock, data_size, unit, true)?;
        Ok(self.push(label.into(), level, Box::new(timer)))
    }

    /// Records an externally created timer at an explicit level.
    ///
    /// The timer is taken as-is; it is not started.
    pub fn adopt(
        &mut self,
        label: impl Into<String>,
        level: usize,
        timer: Box<dyn Timer>,
    ) -> TimerId {
        self.push(label.into(), level, timer)
    }

    /// Returns the timer behind `id`.
    pub fn timer(&self, id: TimerId) -> TimerResult<&dyn Timer> {
        Ok(self.record(id)?.timer.as_ref())
    }

    /// Returns the timer behind `id` for start/stop control.
    pub fn timer_mut(&mut self, id: TimerId) -> TimerResult<&mut dyn Timer> {
        let record = self
            .records
            .get_mut(id.0)
            .ok_or(TimerError::UnknownTimer(id.0))?;
        Ok(record.timer.as_mut())
    }

    /// Starts the timer behind `id` again, replacing its previous measurement.
    pub fn start(&mut self, id: TimerId) -> TimerResult<()> {
        self.timer_mut(id)?.start()
    }

    /// Stops the timer behind `id`.
    pub fn stop(&mut self, id: TimerId) -> TimerResult<()> {
        self.timer_mut(id)?.stop()
    }

    /// Binds a [`ScopedTimerStop`] to the timer behind `id`.
    pub fn scoped_stop(
        &mut self,
        id: TimerId,
    ) -> TimerResult<ScopedTimerStop<'_, dyn Timer + '_>> {
        Ok(ScopedTimerStop::new(self.timer_mut(id)?))
    }

    /// Returns the label of the record behind `id`.
    pub fn label(&self, id: TimerId) -> TimerResult<&str> {
        Ok(&self.record(id)?.label)
    }

    /// Returns the nesting level of the record behind `id`.
    pub fn level(&self, id: TimerId) -> TimerResult<usize> {
        Ok(self.record(id)?.level)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no timer has been added.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds a snapshot of every record. Running timers report their live value.
    pub fn report(&self) -> Report {
        Report::build(
            self.records
                .iter()
                .map(|r| (r.label.as_str(), r.level, r.timer.as_ref() as &dyn Timer)),
        )
    }

    /// Writes the text report to `out`, one line per record.
    pub fn write_report<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        self.report().render(&self.config, out)
    }

    /// Writes the text report to standard output.
    ///
    /// Timers are read, never stopped; the call can be repeated.
    pub fn flush(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_report(&mut out)?;
        out.flush()
    }

    fn record(&self, id: TimerId) -> TimerResult<&TimerRecord> {
        self.records.get(id.0).ok_or(TimerError::UnknownTimer(id.0))
    }

    fn next_level(&self) -> usize {
        self.records
            .iter()
            .rev()
            .find(|r| !r.timer.is_stopped())
            .map_or(0, |r| r.level + 1)
    }

    fn push(&mut self, label: String, level: usize, timer: Box<dyn Timer>) -> TimerId {
        log::debug!(
            "Registered {} timer '{}' at level {}",
            timer.type_label(),
            label,
            level
        );
        self.records.push(TimerRecord {
            timer,
            label,
            level,
        });
        TimerId(self.records.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::device::tests::SimulatedDevice;
    use crate::timer::tests::ManualBackend;
    use crate::timer::MeasuredTimer;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Inferred levels nest under the most recent running timer and reset to 0 once everything stopped.
    #[test]
    fn levels_follow_running_timers() {
        let mut pool = TimerPool::new();
        let frame = pool.add_host_timer("frame", 0, "");
        let upload = pool.add_host_timer("upload", 0, "");
        pool.stop(upload).unwrap();
        let compute = pool.add_host_timer("compute", 0, "");
        let inner = pool.add_host_timer("compute/inner", 0, "");
        pool.stop(inner).unwrap();
        pool.stop(compute).unwrap();
        pool.stop(frame).unwrap();
        let next = pool.add_host_timer("next-frame", 0, "");

        let levels: Vec<usize> = [frame, upload, compute, inner, next]
            .iter()
            .map(|id| pool.level(*id).unwrap())
            .collect();
        assert_eq!(levels, vec![0, 1, 1, 2, 0]);
    }

    /// Levels passed by the caller are recorded as-is, for both backends.
    #[test]
    fn explicit_levels_override_inference() {
        let device = Arc::new(SimulatedDevice::new());
        let mut pool = TimerPool::with_device(device);
        let outer = pool.add_host_timer("outer", 0, "");
        let sibling = pool.add_host_timer_at("sibling", 0, 0, "");
        let deep = pool.add_device_timer_at("deep", 4, 0, "").unwrap();

        assert_eq!(pool.level(outer).unwrap(), 0);
        assert_eq!(pool.level(sibling).unwrap(), 0);
        assert_eq!(pool.level(deep).unwrap(), 4);
        assert!(!pool.timer(deep).unwrap().is_stopped());
    }

    /// A pathological caller-chosen level still yields one line per record.
    #[test]
    fn huge_explicit_level_does_not_void_report() {
        let mut pool = TimerPool::new();
        let deep = pool.add_host_timer_at("deep", usize::MAX / 2 + 1, 0, "");
        pool.stop(deep).unwrap();
        let top = pool.add_host_timer_at("top", 0, 0, "");
        pool.stop(top).unwrap();

        let mut buf = Vec::new();
        pool.write_report(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("deep: "));
        assert!(lines[1].starts_with("top: "));
    }

    /// A host-only pool refuses device timers without recording anything.
    #[test]
    fn device_timer_needs_a_device() {
        let mut pool = TimerPool::new();
        let result = pool.add_device_timer("kernel", 0, "");
        assert!(matches!(result, Err(TimerError::BackendUnavailable(_))));
        let result = pool.add_device_timer_at("kernel", 1, 0, "");
        assert!(matches!(result, Err(TimerError::BackendUnavailable(_))));
        assert!(pool.is_empty());
    }

    /// Shares of device timers are computed against the level-0 total.
    #[test]
    fn device_timers_report_percentages_of_total() {
        let device = Arc::new(SimulatedDevice::new());
        let mut pool = TimerPool::with_device(device.clone());
        assert!(pool.has_device());

        let kernel = pool.add_device_timer("kernel", 1 << 20, "bytes").unwrap();
        device.advance_ms(30);
        pool.stop(kernel).unwrap();

        let readback = pool.add_device_timer("readback", 0, "").unwrap();
        device.advance_ms(10);
        pool.stop(readback).unwrap();

        let report = pool.report();
        assert_relative_eq!(report.total_secs, 0.040, epsilon = 1e-12);
        assert_relative_eq!(report.rows[0].percent.unwrap(), 75.0, epsilon = 1e-9);
        assert_relative_eq!(report.rows[1].percent.unwrap(), 25.0, epsilon = 1e-9);
        assert_eq!(report.rows[0].timer_type, "device");
        assert!(report.rows[0].throughput.is_some());
    }

    /// A record whose measurement failed renders as unavailable and the others still render.
    #[test]
    fn failed_record_does_not_void_report() {
        let device = Arc::new(SimulatedDevice::new());
        let mut pool = TimerPool::with_device(device.clone());

        let broken = pool.add_device_timer("broken", 0, "").unwrap();
        device.fail_sync.set(true);
        assert!(pool.stop(broken).is_err());
        device.fail_sync.set(false);

        let ok = pool.add_device_timer("ok", 0, "").unwrap();
        device.advance_ms(20);
        pool.stop(ok).unwrap();

        let text = pool.report().to_text(pool.config());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["broken: unavailable", "ok: 0.020000 s (100.0%)"]);
    }

    /// Adopted timers keep their level and are not started by the pool.
    #[test]
    fn adopted_timers_keep_explicit_level() {
        let now = Rc::new(Cell::new(0.0));
        let mut pool = TimerPool::new();
        let total = pool.adopt(
            "total",
            0,
            Box::new(MeasuredTimer::from_backend(ManualBackend::new(now.clone()), 0, "")),
        );
        let part = pool.adopt(
            "part",
            3,
            Box::new(MeasuredTimer::from_backend(ManualBackend::new(now.clone()), 0, "")),
        );
        pool.start(total).unwrap();
        pool.start(part).unwrap();
        now.set(2.0);
        pool.stop(part).unwrap();
        now.set(8.0);
        pool.stop(total).unwrap();

        assert_eq!(pool.level(part).unwrap(), 3);
        let report = pool.report();
        assert_relative_eq!(report.total_secs, 8.0);
        assert_relative_eq!(report.rows[1].percent.unwrap(), 25.0);
    }

    /// A guard over a pool timer stops it at scope exit.
    #[test]
    fn scoped_stop_closes_pool_timer() {
        let mut pool = TimerPool::new();
        let id = pool.add_host_timer("scoped", 0, "");
        {
            let _guard = pool.scoped_stop(id).unwrap();
        }
        assert!(pool.timer(id).unwrap().is_stopped());
    }

    /// Handles from another pool are rejected instead of aliasing a record.
    #[test]
    fn unknown_ids_are_rejected() {
        let mut other = TimerPool::new();
        other.add_host_timer("a", 0, "");
        let foreign = other.add_host_timer("b", 0, "");

        let mut pool = TimerPool::new();
        assert_eq!(pool.stop(foreign), Err(TimerError::UnknownTimer(1)));
        assert!(pool.label(foreign).is_err());
    }

    /// Reporting a running timer flags it and leaves it running.
    #[test]
    fn report_of_running_timer_is_live_and_flagged() {
        let mut pool = TimerPool::new();
        pool.add_host_timer("still-running", 0, "");
        let report = pool.report();
        assert!(report.rows[0].running);
        assert!(!pool.timer(TimerId(0)).unwrap().is_stopped());
    }
}
