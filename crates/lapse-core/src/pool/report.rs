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

//! The aggregated report of a timer pool and its text rendering.
//!
//! Percentages are computed against the sum of the level-0 records that have
//! an elapsed value. Nested records are measured independently; a parent's
//! elapsed time is never derived from its children.

use crate::config::ReportConfig;
use crate::timer::{throughput_of, Timer};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Widest indentation a row is rendered with, in spaces.
pub const MAX_INDENT: usize = 128;

/// One record of the report, in pool insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// The label given when the timer was added.
    pub label: String,
    /// Nesting depth, used for indentation only.
    pub level: usize,
    /// The backend type label (`host`, `device`, ...).
    pub timer_type: String,
    /// Elapsed seconds, or `None` if the measurement failed.
    pub elapsed_secs: Option<f64>,
    /// Share of the report total in [0, 100], or `None` if elapsed is unavailable.
    pub percent: Option<f64>,
    /// `data_size / elapsed` in `unit` per second, when the timer carries both.
    pub throughput: Option<f64>,
    /// Unit of the throughput figure.
    pub unit: String,
    /// `true` if the timer was still running when the report was built.
    pub running: bool,
}

/// A snapshot of every record of a pool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    /// Rows in insertion order.
    pub rows: Vec<ReportRow>,
    /// Sum of the available level-0 elapsed times, in seconds.
    pub total_secs: f64,
}

impl Report {
    /// Builds a report from `(label, level, timer)` triples.
    ///
    /// A timer whose elapsed time cannot be read is kept in the report with no
    /// value; it never aborts the report.
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize, &'a dyn Timer)>,
    {
        let measured: Vec<_> = records
            .into_iter()
            .map(|(label, level, timer)| {
                let elapsed = match timer.elapsed() {
                    Ok(secs) => Some(secs),
                    Err(e) => {
                        log::warn!("Timer '{label}' has no elapsed value: {e}");
                        None
                    }
                };
                (label, level, timer, elapsed)
            })
            .collect();

        let total_secs: f64 = measured
            .iter()
            .filter(|(_, level, _, _)| *level == 0)
            .filter_map(|(_, _, _, elapsed)| *elapsed)
            .sum();

        let rows = measured
            .into_iter()
            .map(|(label, level, timer, elapsed)| ReportRow {
                label: label.to_owned(),
                level,
                timer_type: timer.type_label().to_owned(),
                elapsed_secs: elapsed,
                percent: elapsed.map(|secs| percent_of(secs, total_secs)),
                throughput: elapsed
                    .and_then(|secs| throughput_of(timer.data_size(), timer.unit(), secs)),
                unit: timer.unit().to_owned(),
                running: !timer.is_stopped(),
            })
            .collect();

        Self { rows, total_secs }
    }

    /// Writes one line per row to `out`.
    pub fn render<W: Write + ?Sized>(&self, config: &ReportConfig, out: &mut W) -> io::Result<()> {
        for row in &self.rows {
            writeln!(out, "{}", format_row(row, config))?;
        }
        Ok(())
    }

    /// Renders the report into a string.
    pub fn to_text(&self, config: &ReportConfig) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.render(config, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn percent_of(secs: f64, total_secs: f64) -> f64 {
    if total_secs > 0.0 {
        (100.0 * secs / total_secs).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn format_row(row: &ReportRow, config: &ReportConfig) -> String {
    let width = row.level.saturating_mul(config.indent_width).min(MAX_INDENT);
    let indent = " ".repeat(width);
    let mut line = format!("{indent}{}", row.label);
    if config.show_type {
        line.push_str(&format!(" [{}]", row.timer_type));
    }

    let Some(secs) = row.elapsed_secs else {
        line.push_str(": unavailable");
        return line;
    };

    let precision = config.precision;
    line.push_str(&format!(
        ": {secs:.precision$} s ({:.1}%)",
        row.percent.unwrap_or_default()
    ));
    if config.show_throughput {
        if let Some(rate) = row.throughput {
            line.push_str(&format!(" [{rate:.2} {}/s]", row.unit));
        }
    }
    if row.running {
        line.push_str(" (running)");
    }
    line
}
