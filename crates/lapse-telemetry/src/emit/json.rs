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

//! JSON emitter for pool reports.

use anyhow::{Context, Result};
use lapse_core::Report;
use std::io::Write;

/// Serializes a [`Report`] as a JSON document.
///
/// Unavailable measurements are emitted as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportEmitter {
    pretty: bool,
}

impl JsonReportEmitter {
    /// Creates an emitter producing compact, single-line JSON.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Creates an emitter producing indented JSON.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Writes `report` to `out`, followed by a newline.
    pub fn emit<W: Write>(&self, report: &Report, mut out: W) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut out, report)
        } else {
            serde_json::to_writer(&mut out, report)
        }
        .context("Failed to serialize timer report")?;
        writeln!(out).context("Failed to terminate timer report")?;
        Ok(())
    }

    /// Serializes `report` into a string.
    pub fn to_string(&self, report: &Report) -> Result<String> {
        let mut buf = Vec::new();
        self.emit(report, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapse_core::ReportRow;
    use serde_json::Value;

    fn sample_report() -> Report {
        Report {
            rows: vec![
                ReportRow {
                    label: "upload".to_owned(),
                    level: 0,
                    timer_type: "host".to_owned(),
                    elapsed_secs: Some(0.5),
                    percent: Some(100.0),
                    throughput: Some(128.0),
                    unit: "MiB".to_owned(),
                    running: false,
                },
                ReportRow {
                    label: "kernel".to_owned(),
                    level: 1,
                    timer_type: "device".to_owned(),
                    elapsed_secs: None,
                    percent: None,
                    throughput: None,
                    unit: String::new(),
                    running: false,
                },
            ],
            total_secs: 0.5,
        }
    }

    /// Compact JSON fits on one line and ends with a newline.
    #[test]
    fn compact_output_is_one_line() {
        let text = JsonReportEmitter::new().to_string(&sample_report()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
    }

    /// Unavailable values serialize as null next to the available ones.
    #[test]
    fn unavailable_rows_serialize_as_null() {
        let text = JsonReportEmitter::pretty()
            .to_string(&sample_report())
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["total_secs"], 0.5);
        assert_eq!(value["rows"][0]["label"], "upload");
        assert_eq!(value["rows"][0]["throughput"], 128.0);
        assert!(value["rows"][1]["elapsed_secs"].is_null());
        assert_eq!(value["rows"][1]["timer_type"], "device");
    }
}
