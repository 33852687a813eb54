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

//! Settings controlling how a pool renders its text report.

use serde::{Deserialize, Serialize};

/// A collection of settings that affect the text rendering of a report.
///
/// The core never loads this from disk; host applications embed it in their
/// own configuration and hand it to [`crate::TimerPool::with_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of decimal places for elapsed seconds and throughput.
    pub precision: usize,
    /// Number of spaces of indentation per nesting level.
    pub indent_width: usize,
    /// If `true`, a throughput figure is appended for records that carry a unit and a data size.
    pub show_throughput: bool,
    /// If `true`, the backend type label (`host`/`device`) follows the record label.
    pub show_type: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            precision: 6,
            indent_width: 2,
            show_throughput: true,
            show_type: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A partial document keeps the defaults for every field it does not name.
    #[test]
    fn partial_document_fills_defaults() {
        let config: ReportConfig = serde_json::from_str(r#"{"precision":3}"#).unwrap();
        assert_eq!(
            config,
            ReportConfig {
                precision: 3,
                ..Default::default()
            }
        );

        let empty: ReportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ReportConfig::default());
    }

    /// Settings embedded in a host application's config survive a round trip.
    #[test]
    fn embedded_settings_round_trip() {
        let config = ReportConfig {
            precision: 2,
            indent_width: 4,
            show_throughput: false,
            show_type: true,
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: ReportConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
