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

//! Error types shared by every timer backend and by the pool.

use thiserror::Error;

/// An error raised while controlling or querying a timer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `start()` was called on a timer that is already running.
    #[error("timer is already started")]
    AlreadyStarted,
    /// The timing source of the requested backend cannot be used.
    #[error("timing backend unavailable: {0}")]
    BackendUnavailable(String),
    /// The device failed to record, resolve or read back a timestamp.
    #[error("device timing error: {0}")]
    DeviceTiming(String),
    /// The last measurement of a stopped timer failed, so it has no value.
    #[error("elapsed time is unavailable")]
    Unavailable,
    /// A pool handle that does not refer to any record of the pool.
    #[error("no timer registered with id {0}")]
    UnknownTimer(usize),
}

/// A specialized `Result` type for timer operations.
pub type TimerResult<T> = Result<T, TimerError>;
