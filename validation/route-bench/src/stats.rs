//! Aggregate statistics over sample-set scalars.
//!
//! Quantiles use linear interpolation between closest ranks. Confidence
//! intervals use the normal approximation
//! `h = z((1 + c) / 2) * stdev / sqrt(n - 1)` with the sample standard
//! deviation.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

use crate::error::StatsError;
use crate::generator::BenchmarkKind;
use crate::samples::{RawSamples, Reduction};

/// A point value with an optional confidence half-width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_width: Option<f64>,
}

impl Estimate {
    pub fn point(value: f64) -> Self {
        Self {
            value,
            half_width: None,
        }
    }
}

/// Summary of one benchmark invocation. Latencies are in milliseconds per
/// sample-set scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub kind: BenchmarkKind,
    pub timestamp: String,
    /// Number of scalars the statistics were computed over.
    pub sample_sets: usize,
    /// Number of measured requests behind those scalars.
    pub requests: usize,
    pub reduction: Reduction,
    pub confidence: f64,
    pub ops_per_second: Estimate,
    /// Scalars behind `ops_per_second`. Zero-duration scalars have no
    /// finite rate and are left out, so this can be below `sample_sets`.
    pub throughput_sets: usize,
    pub min: Estimate,
    pub median: Estimate,
    pub mean: Estimate,
    pub p95: Estimate,
    pub p99: Estimate,
    pub max: Estimate,
}

/// Mean and half-width of a confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub mean: f64,
    pub half_width: f64,
}

/// Two-sided z-score for `confidence`, e.g. about 1.96 for 0.95.
pub fn z_score(confidence: f64) -> Result<f64, StatsError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(StatsError::InvalidConfidence(confidence));
    }
    let normal = Normal::new(0.0, 1.0).expect("unit normal is valid");
    Ok(normal.inverse_cdf((1.0 + confidence) / 2.0))
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() as f64 - 1.0)).sqrt()
}

pub fn confidence_interval(values: &[f64], confidence: f64) -> Result<Interval, StatsError> {
    let z = z_score(confidence)?;
    let n = values.len();
    if n <= 1 {
        return Err(StatsError::InsufficientSamples { n });
    }
    Ok(Interval {
        mean: mean(values),
        half_width: z * sample_std_dev(values) / ((n - 1) as f64).sqrt(),
    })
}

/// Quantile `p` in [0, 1] of ascending, non-empty `sorted`.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Reduce raw samples to an [`AggregateRow`].
///
/// Fails only on an empty sample buffer or an invalid confidence. With a
/// single scalar the row is still produced, without half-widths.
pub fn summarize(
    kind: BenchmarkKind,
    samples: &RawSamples,
    reduction: Reduction,
    confidence: f64,
) -> Result<AggregateRow, StatsError> {
    z_score(confidence)?;

    let seconds = samples.scalars(reduction);
    if seconds.is_empty() {
        return Err(StatsError::NoSamples);
    }

    let mut ms: Vec<f64> = seconds.iter().map(|s| s * 1000.0).collect();
    ms.sort_by(|a, b| a.total_cmp(b));

    // Throughput is per request, whatever the reduction.
    let requests_per_scalar = match reduction {
        Reduction::Sum => samples.layout().requests_per_set() as f64,
        Reduction::Mean => 1.0,
    };
    let ops: Vec<f64> = seconds
        .iter()
        .filter(|s| **s > 0.0)
        .map(|s| requests_per_scalar / s)
        .collect();
    let dropped = seconds.len() - ops.len();
    if dropped > 0 {
        warn!(
            dropped,
            kept = ops.len(),
            "Zero-duration samples left out of throughput"
        );
    }

    let mean_ms = with_interval(&ms, confidence);
    let ops_per_second = if ops.is_empty() {
        Estimate::point(0.0)
    } else {
        with_interval(&ops, confidence)
    };

    Ok(AggregateRow {
        kind,
        timestamp: chrono::Utc::now().to_rfc3339(),
        sample_sets: ms.len(),
        requests: samples.len(),
        reduction,
        confidence,
        ops_per_second,
        throughput_sets: ops.len(),
        min: Estimate::point(ms[0]),
        median: Estimate::point(quantile(&ms, 0.5)),
        mean: mean_ms,
        p95: Estimate::point(quantile(&ms, 0.95)),
        p99: Estimate::point(quantile(&ms, 0.99)),
        max: Estimate::point(ms[ms.len() - 1]),
    })
}

fn with_interval(values: &[f64], confidence: f64) -> Estimate {
    match confidence_interval(values, confidence) {
        Ok(interval) => Estimate {
            value: interval.mean,
            half_width: Some(interval.half_width),
        },
        Err(e) => {
            debug!(error = %e, "Reporting point estimate without interval");
            Estimate::point(mean(values))
        }
    }
}
