//! One CLI invocation, independent of argument parsing and process setup.

use std::io::Write;

use tracing::info;

use crate::client::Transport;
use crate::config::BenchConfig;
use crate::corpus::Corpus;
use crate::error::BenchResult;
use crate::report::{OutputFormat, ResultsReport, SummarySink};
use crate::runner::{planned_targets, Runner};
use crate::stats::summarize;

/// What the invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Warm up, measure, report.
    Measure,
    /// Emit the comparison table header and stop. No corpus, no requests.
    Headers,
    /// Print the measured request URLs without contacting the service.
    DumpRequests,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: BenchConfig,
    pub mode: Mode,
    pub output: OutputFormat,
    pub show_progress: bool,
}

/// Emit the comparison table header to `out` and the CI summary. Needs no
/// configuration at all.
pub fn write_headers(sink: &SummarySink, out: &mut impl Write) -> BenchResult<()> {
    let header = ResultsReport::markdown_header();
    out.write_all(header.as_bytes())?;
    sink.append(&header)?;
    Ok(())
}

pub async fn execute<T: Transport>(
    invocation: &Invocation,
    transport: &T,
    sink: &SummarySink,
    out: &mut impl Write,
) -> BenchResult<()> {
    let config = &invocation.config;

    if invocation.mode == Mode::Headers {
        return write_headers(sink, out);
    }

    config.validate()?;
    let corpus = Corpus::from_path(config.gps_traces()?)?;

    if invocation.mode == Mode::DumpRequests {
        for target in planned_targets(config.method, &corpus, config.seed, &config.layout())? {
            writeln!(out, "{}", target.url(&config.host))?;
        }
        return Ok(());
    }

    let layout = config.layout();
    let mut runner = Runner::new(config, &corpus, transport).show_progress(invocation.show_progress);
    let samples = runner.run(config.method, &layout).await?;
    let row = summarize(config.method, &samples, config.reduction, config.confidence)?;

    info!(
        kind = %row.kind,
        mean_ms = row.mean.value,
        p99_ms = row.p99.value,
        "Benchmark finished"
    );

    match invocation.output {
        OutputFormat::Table => writeln!(out, "{}", ResultsReport::format_table(&row))?,
        OutputFormat::Json => {
            let json = ResultsReport::format_json(&row, runner.summary()).map_err(std::io::Error::from)?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "{}", ResultsReport::csv_header())?;
            writeln!(out, "{}", ResultsReport::format_csv(&row))?;
        }
        OutputFormat::Markdown => {
            write!(out, "{}", ResultsReport::markdown_header())?;
            write!(out, "{}", ResultsReport::markdown_row(&row))?;
        }
    }

    sink.append(&ResultsReport::markdown_row(&row))?;
    Ok(())
}
