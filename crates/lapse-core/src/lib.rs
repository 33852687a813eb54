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

//! # Lapse Core
//!
//! Instrumentation primitives for measuring labeled units of work on the host
//! and on an accelerator device, and for aggregating them into a single report.
//!
//! - [`timer`] defines the [`Timer`] contract, the shared start/stop state
//!   machine and the host and device backends.
//! - [`timer::scoped`] provides [`ScopedTimerStop`], a guard that stops its
//!   timer on every exit path.
//! - [`pool`] owns an ordered, leveled set of timers and renders the report.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod pool;
pub mod timer;

pub use config::ReportConfig;
pub use error::{TimerError, TimerResult};
pub use pool::report::{Report, ReportRow};
pub use pool::{TimerId, TimerPool};
pub use timer::device::{DeviceClock, DeviceTimer, NoDeviceClock};
pub use timer::host::HostTimer;
pub use timer::scoped::ScopedTimerStop;
pub use timer::stopwatch::Stopwatch;
pub use timer::{throughput, throughput_of, MeasuredTimer, Timer, TimerBackend};
