//! Results reporting and formatting.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use clap::ValueEnum;
use comfy_table::{presets::ASCII_FULL, Table};
use serde::Serialize;
use tracing::debug;

use crate::runner::RunSummary;
use crate::stats::{AggregateRow, Estimate};

/// Environment variable naming the CI job summary file.
pub const SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

/// Columns of the markdown comparison table, after the method column.
pub const MARKDOWN_COLUMNS: [&str; 8] = [
    "Samples",
    "Min (ms)",
    "Median (ms)",
    "Mean (ms)",
    "p95 (ms)",
    "p99 (ms)",
    "Max (ms)",
    "Ops/s",
];

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Markdown,
}

/// Formats aggregate rows for output.
pub struct ResultsReport;

impl ResultsReport {
    /// Format a row as a console table.
    pub fn format_table(row: &AggregateRow) -> String {
        let mut table = Table::new();
        table.load_preset(ASCII_FULL).set_header(vec![
            format!("Benchmark: {}", row.kind),
            format!("{} sample-sets, {} requests", row.sample_sets, row.requests),
        ]);

        let lines = [
            ("Min time", format_estimate(&row.min, "ms")),
            ("Median time", format_estimate(&row.median, "ms")),
            ("Mean time", format_interval(&row.mean, "ms")),
            ("95th percentile", format_estimate(&row.p95, "ms")),
            ("99th percentile", format_estimate(&row.p99, "ms")),
            ("Max time", format_estimate(&row.max, "ms")),
            ("Ops/s", format_interval(&row.ops_per_second, "")),
        ];
        for (label, value) in lines {
            table.add_row(vec![label.to_string(), value]);
        }
        table.add_row(vec![
            "Confidence".to_string(),
            format!("{:.0}%", row.confidence * 100.0),
        ]);

        table.to_string()
    }

    /// Header and alignment rows of the markdown comparison table.
    pub fn markdown_header() -> String {
        let mut out = String::from("| Method  |");
        for column in MARKDOWN_COLUMNS {
            out.push_str(&format!(" {} |", column));
        }
        out.push_str("\n| ------- |");
        for column in MARKDOWN_COLUMNS {
            out.push_str(&format!(" {}: |", "-".repeat(column.len() - 1)));
        }
        out.push('\n');
        out
    }

    /// One markdown row keyed by benchmark kind.
    pub fn markdown_row(row: &AggregateRow) -> String {
        let cells = [
            row.sample_sets.to_string(),
            format_estimate(&row.min, ""),
            format_estimate(&row.median, ""),
            format_interval(&row.mean, ""),
            format_estimate(&row.p95, ""),
            format_estimate(&row.p99, ""),
            format_estimate(&row.max, ""),
            format_interval(&row.ops_per_second, ""),
        ];
        format!("| {:7} | {} |\n", row.kind.as_str(), cells.join(" | "))
    }

    /// Format a row and run counters as JSON.
    pub fn format_json(row: &AggregateRow, summary: &RunSummary) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            #[serde(flatten)]
            row: &'a AggregateRow,
            successes: u64,
            empty_results: u64,
        }

        serde_json::to_string_pretty(&JsonReport {
            row,
            successes: summary.successes,
            empty_results: summary.empty_results,
        })
    }

    /// Format a row as CSV.
    pub fn format_csv(row: &AggregateRow) -> String {
        format!(
            "{},{},{},{},{:.3},{:.3},{:.3},{},{:.3},{:.3},{:.3},{:.2},{}",
            row.timestamp,
            row.kind,
            row.sample_sets,
            row.requests,
            row.min.value,
            row.median.value,
            row.mean.value,
            half_width_cell(&row.mean),
            row.p95.value,
            row.p99.value,
            row.max.value,
            row.ops_per_second.value,
            half_width_cell(&row.ops_per_second),
        )
    }

    /// CSV header row.
    pub fn csv_header() -> &'static str {
        "timestamp,method,sample_sets,requests,min_ms,median_ms,mean_ms,mean_ci_ms,p95_ms,p99_ms,max_ms,ops_per_sec,ops_ci"
    }
}

/// `value +- half_width` when the estimate carries an interval.
fn format_estimate(estimate: &Estimate, unit: &str) -> String {
    match estimate.half_width {
        Some(h) => format!("{:.2}{unit} +- {:.3}{unit}", estimate.value, h),
        None => format!("{:.2}{unit}", estimate.value),
    }
}

/// Like [`format_estimate`], but says so when the interval could not be
/// computed (fewer than two sample-sets).
fn format_interval(estimate: &Estimate, unit: &str) -> String {
    match estimate.half_width {
        Some(_) => format_estimate(estimate, unit),
        None => format!("{:.2}{unit} +- n/a", estimate.value),
    }
}

fn half_width_cell(estimate: &Estimate) -> String {
    estimate
        .half_width
        .map(|h| format!("{:.3}", h))
        .unwrap_or_default()
}

/// Append-only CI summary file, active when [`SUMMARY_ENV`] is set.
#[derive(Debug, Clone, Default)]
pub struct SummarySink {
    path: Option<PathBuf>,
}

impl SummarySink {
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(SUMMARY_ENV).map(PathBuf::from),
        }
    }

    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Append `text` to the summary file, creating it if needed. No-op when
    /// disabled.
    pub fn append(&self, text: &str) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())?;
        debug!(path = %path.display(), bytes = text.len(), "Appended to CI summary");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::BenchmarkKind;
    use crate::samples::Reduction;

    fn row(half_width: Option<f64>) -> AggregateRow {
        let point = Estimate::point;
        AggregateRow {
            kind: BenchmarkKind::Route,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            sample_sets: 100,
            requests: 100,
            reduction: Reduction::Sum,
            confidence: 0.95,
            ops_per_second: Estimate {
                value: 250.0,
                half_width,
            },
            throughput_sets: 100,
            min: point(1.0),
            median: point(3.5),
            mean: Estimate {
                value: 4.0,
                half_width,
            },
            p95: point(9.25),
            p99: point(12.0),
            max: point(15.5),
        }
    }

    #[test]
    fn test_table_contains_metrics() {
        let table = ResultsReport::format_table(&row(Some(0.125)));
        assert!(table.contains("Benchmark: route"));
        assert!(table.contains("4.00ms +- 0.125ms"));
        assert!(table.contains("9.25ms"));
        assert!(table.contains("95%"));
        assert!(table.is_ascii());
    }

    #[test]
    fn test_missing_interval_is_reported() {
        let table = ResultsReport::format_table(&row(None));
        assert!(table.contains("4.00ms +- n/a"));
    }

    #[test]
    fn test_markdown_header_and_row_align() {
        let header = ResultsReport::markdown_header();
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("| Method  | Samples |"));
        assert!(lines[1].starts_with("| ------- | ------: |"));

        let md = ResultsReport::markdown_row(&row(Some(0.5)));
        assert!(md.starts_with("| route   | 100 |"));
        assert!(md.ends_with(" |\n"));
        let columns = |s: &str| s.matches('|').count();
        assert_eq!(columns(lines[0]), columns(md.trim_end()));
        assert_eq!(columns(lines[1]), columns(md.trim_end()));
        assert!(md.is_ascii());
    }

    #[test]
    fn test_csv_matches_header() {
        let csv = ResultsReport::format_csv(&row(Some(0.5)));
        assert_eq!(
            csv.split(',').count(),
            ResultsReport::csv_header().split(',').count()
        );
    }

    #[test]
    fn test_json_includes_counters() {
        let summary = RunSummary {
            successes: 97,
            empty_results: 3,
            targets: Vec::new(),
        };
        let json = ResultsReport::format_json(&row(Some(0.5)), &summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "route");
        assert_eq!(value["empty_results"], 3);
        assert_eq!(value["throughput_sets"], 100);
        assert_eq!(value["mean"]["half_width"], 0.5);
        assert!(value.get("targets").is_none());
    }

    #[test]
    fn test_summary_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        let sink = SummarySink::to_path(&path);

        sink.append(&ResultsReport::markdown_header()).unwrap();
        sink.append(&ResultsReport::markdown_row(&row(None))).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(written.lines().last().unwrap().starts_with("| route"));
    }

    #[test]
    fn test_disabled_sink_is_noop() {
        SummarySink::disabled().append("ignored").unwrap();
    }
}
