//! Raw sample storage and the reduction to one scalar per sample-set.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Shape of the measurement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    /// N independent requests; each one is its own sample-set.
    Flat { samples: usize },
    /// S sample-sets of R requests each. Every set issues the same request
    /// sequence, so sets differ only in timing.
    Grid {
        sample_sets: usize,
        requests_per_set: usize,
    },
}

impl SampleLayout {
    /// `requests_per_set <= 1` collapses to the flat layout.
    pub fn new(sample_sets: usize, requests_per_set: usize) -> Self {
        if requests_per_set <= 1 {
            SampleLayout::Flat {
                samples: sample_sets,
            }
        } else {
            SampleLayout::Grid {
                sample_sets,
                requests_per_set,
            }
        }
    }

    pub fn sample_sets(&self) -> usize {
        match *self {
            SampleLayout::Flat { samples } => samples,
            SampleLayout::Grid { sample_sets, .. } => sample_sets,
        }
    }

    pub fn requests_per_set(&self) -> usize {
        match *self {
            SampleLayout::Flat { .. } => 1,
            SampleLayout::Grid {
                requests_per_set, ..
            } => requests_per_set,
        }
    }

    pub fn total_requests(&self) -> usize {
        self.sample_sets() * self.requests_per_set()
    }
}

/// How a grid row is collapsed into one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Total time to issue the whole set.
    #[default]
    Sum,
    /// Mean time per request in the set.
    Mean,
}

/// Timings recorded by the sampling engine, in issue order.
///
/// Sample `(set, index)` is stored at `set * requests_per_set + index`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSamples {
    layout: SampleLayout,
    values: Vec<Duration>,
}

impl RawSamples {
    pub fn new(layout: SampleLayout) -> Self {
        Self {
            layout,
            values: Vec::with_capacity(layout.total_requests()),
        }
    }

    /// Wrap already-collected timings.
    pub fn from_values(layout: SampleLayout, values: Vec<Duration>) -> Self {
        Self { layout, values }
    }

    pub fn push(&mut self, sample: Duration) {
        self.values.push(sample);
    }

    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub fn values(&self) -> &[Duration] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One value in seconds per complete sample-set. A trailing partial set
    /// is dropped.
    pub fn scalars(&self, reduction: Reduction) -> Vec<f64> {
        let per_set = self.layout.requests_per_set().max(1);
        self.values
            .chunks_exact(per_set)
            .map(|row| {
                let total: f64 = row.iter().map(Duration::as_secs_f64).sum();
                match reduction {
                    Reduction::Sum => total,
                    Reduction::Mean => total / per_set as f64,
                }
            })
            .collect()
    }
}
