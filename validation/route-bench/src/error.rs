//! Error types for the benchmark harness.
//!
//! Every failure here is local and synchronous. Nothing is retried: a retry
//! would distort the measured latency and change the request sequence.

use std::path::PathBuf;
use thiserror::Error;

use crate::generator::BenchmarkKind;

/// Result type alias using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;

/// Top-level error for a benchmark invocation.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The GPS trace corpus could not be loaded.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to open corpus {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corpus is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Malformed corpus record at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Failed to read corpus: {0}")]
    Csv(#[from] csv::Error),
}

/// A benchmark kind name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown benchmark kind '{0}' (expected one of: route, nearest, table, trip, match)")]
pub struct UnknownKindError(pub String);

/// The corpus cannot satisfy a request shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("{kind} request needs {needed} distinct points but the corpus has {available}")]
    CorpusTooSmall {
        kind: BenchmarkKind,
        needed: usize,
        available: usize,
    },

    #[error("match request needs at least one track but the corpus has none")]
    NoTracks,
}

/// A response outside the benign empty-result vocabulary. Aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasurementError {
    #[error("HTTP {status} from {url}: {body}")]
    UnexpectedResponse {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Dispersion statistics that cannot be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("No samples to summarize")]
    NoSamples,

    #[error("Need at least 2 values for a confidence interval, got {n}")]
    InsufficientSamples { n: usize },

    #[error("Confidence must be in (0, 1), got {0}")]
    InvalidConfidence(f64),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Failure reported by a [`crate::client::Transport`] before any response
/// was received (connection refused, timeout, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}
