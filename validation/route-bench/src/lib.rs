//! Reproducible latency benchmark for a routing HTTP service.
//!
//! This crate provides tools to:
//! - Load a GPS trace corpus (CSV, optionally gzip-compressed)
//! - Generate seeded, repeatable route/nearest/table/trip/match requests
//! - Issue them strictly one at a time and time each response
//! - Summarize latencies with percentiles and confidence intervals
//! - Output results as a console table, JSON, CSV or a markdown row

pub mod app;
pub mod client;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generator;
pub mod report;
pub mod runner;
pub mod samples;
pub mod stats;

pub use app::{execute, write_headers, Invocation, Mode};
pub use client::{HttpResponse, HttpTransport, ResponseClass, Transport};
pub use clock::ClockKind;
pub use config::BenchConfig;
pub use corpus::{Corpus, GeoPoint, Track};
pub use error::{BenchError, BenchResult};
pub use generator::{build_request, BenchRng, BenchmarkKind, RequestGenerator, RequestTarget};
pub use report::{OutputFormat, ResultsReport, SummarySink};
pub use runner::{planned_targets, RunSummary, Runner};
pub use samples::{RawSamples, Reduction, SampleLayout};
pub use stats::{summarize, AggregateRow, Estimate};
