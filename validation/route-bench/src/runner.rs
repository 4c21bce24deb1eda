//! Serial warmup and measurement loop.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, trace};

use crate::client::{ResponseClass, Transport};
use crate::clock::ClockKind;
use crate::config::BenchConfig;
use crate::corpus::Corpus;
use crate::error::{BenchResult, GenerateError, MeasurementError};
use crate::generator::{BenchmarkKind, RequestGenerator, RequestTarget};
use crate::samples::{RawSamples, SampleLayout};

/// Counters for the measured phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub successes: u64,
    /// Requests answered with a benign "nothing found" code.
    pub empty_results: u64,
    /// Paths of measured requests, in issue order, when recording is on.
    pub targets: Vec<String>,
}

/// Drives one benchmark kind against one host, one request at a time.
pub struct Runner<'a, T: Transport> {
    corpus: &'a Corpus,
    transport: &'a T,
    host: String,
    warmup: usize,
    seed: u64,
    clock: ClockKind,
    record_targets: bool,
    show_progress: bool,
    summary: RunSummary,
}

impl<'a, T: Transport> Runner<'a, T> {
    pub fn new(config: &BenchConfig, corpus: &'a Corpus, transport: &'a T) -> Self {
        Self {
            corpus,
            transport,
            host: config.host.clone(),
            warmup: config.warmup,
            seed: config.seed,
            clock: config.clock,
            record_targets: false,
            show_progress: false,
            summary: RunSummary::default(),
        }
    }

    /// Keep the path of every measured request in [`RunSummary::targets`].
    pub fn record_targets(mut self, enabled: bool) -> Self {
        self.record_targets = enabled;
        self
    }

    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Warm up, then measure `layout`.
    ///
    /// The generator is reseeded at the start of measurement and, for a
    /// grid, at the start of every sample-set, so every run issues the same
    /// requests. Any fatal response aborts without partial results.
    pub async fn run(&mut self, kind: BenchmarkKind, layout: &SampleLayout) -> BenchResult<RawSamples> {
        self.summary = RunSummary::default();
        let mut generator = RequestGenerator::new(kind, self.corpus, self.seed);

        info!(
            kind = %kind,
            host = %self.host,
            warmup = self.warmup,
            sample_sets = layout.sample_sets(),
            requests_per_set = layout.requests_per_set(),
            clock = ?self.clock,
            seed = self.seed,
            "Starting benchmark"
        );

        for _ in 0..self.warmup {
            let target = generator.next_target()?;
            self.issue(&target.url(&self.host), false).await?;
        }
        debug!(requests = self.warmup, "Warmup complete");

        let (passes, per_pass) = reseed_passes(layout);
        let pb = self.progress_bar(layout.total_requests() as u64);
        let mut samples = RawSamples::new(*layout);

        for pass in 0..passes {
            generator.reseed(self.seed);
            trace!(pass, seed = self.seed, "Reseeded request generator");

            for _ in 0..per_pass {
                let target = generator.next_target()?;
                let elapsed = self.issue(&target.url(&self.host), true).await?;
                samples.push(elapsed);
                if self.record_targets {
                    self.summary.targets.push(target.path());
                }
                pb.inc(1);
            }
        }

        pb.finish_and_clear();
        info!(
            requests = samples.len(),
            successes = self.summary.successes,
            empty_results = self.summary.empty_results,
            "Measurement complete"
        );
        Ok(samples)
    }

    /// Send one request and classify the response. Only returns once the
    /// body has been read, so requests never overlap.
    async fn issue(&mut self, url: &str, measured: bool) -> BenchResult<std::time::Duration> {
        let stopwatch = self.clock.start();
        let result = self.transport.get(url).await;
        let elapsed = stopwatch.elapsed();

        let response = result.map_err(|e| MeasurementError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        match response.classify() {
            ResponseClass::Success => {
                if measured {
                    self.summary.successes += 1;
                }
            }
            ResponseClass::EmptyResult(code) => {
                debug!(url, status = response.status, code = %code, "No solution found");
                if measured {
                    self.summary.empty_results += 1;
                }
            }
            ResponseClass::Fatal => {
                return Err(MeasurementError::UnexpectedResponse {
                    url: url.to_string(),
                    status: response.status,
                    body: response.body,
                }
                .into());
            }
        }

        trace!(url, elapsed_us = elapsed.as_micros() as u64, measured, "Request complete");
        Ok(elapsed)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} requests {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb
    }
}

/// Number of reseeded passes and requests per pass. A flat layout is one
/// pass; a grid reseeds for every sample-set.
fn reseed_passes(layout: &SampleLayout) -> (usize, usize) {
    match *layout {
        SampleLayout::Flat { samples } => (1, samples),
        SampleLayout::Grid {
            sample_sets,
            requests_per_set,
        } => (sample_sets, requests_per_set),
    }
}

/// The measured requests a run with `seed` and `layout` issues, in order.
/// Warmup requests are not included.
pub fn planned_targets(
    kind: BenchmarkKind,
    corpus: &Corpus,
    seed: u64,
    layout: &SampleLayout,
) -> Result<Vec<RequestTarget>, GenerateError> {
    let (passes, per_pass) = reseed_passes(layout);
    let mut generator = RequestGenerator::new(kind, corpus, seed);
    let mut targets = Vec::with_capacity(layout.total_requests());
    for _ in 0..passes {
        generator.reseed(seed);
        for _ in 0..per_pass {
            targets.push(generator.next_target()?);
        }
    }
    Ok(targets)
}
