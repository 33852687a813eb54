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

//! Report emitters.

pub mod json;

use lapse_core::{Report, ReportConfig};

/// Writes each report line through the `log` facade at `info` level.
///
/// Useful for long-running processes whose standard output is not watched.
pub fn log_report(report: &Report, config: &ReportConfig) {
    for line in report.to_text(config).lines() {
        log::info!("[timers] {line}");
    }
}
