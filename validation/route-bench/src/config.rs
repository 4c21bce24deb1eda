//! Benchmark configuration: defaults, YAML scenarios, validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clock::ClockKind;
use crate::error::ConfigError;
use crate::generator::{BenchmarkKind, DEFAULT_SEED};
use crate::samples::{Reduction, SampleLayout};

pub const DEFAULT_HOST: &str = "http://localhost:5000";

/// Settings for one benchmark invocation.
///
/// Scenario files use the same field names; anything omitted takes the
/// default below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub host: String,
    pub method: BenchmarkKind,
    /// Number of sample-sets (scalars fed to the statistics).
    pub samples: usize,
    /// Requests per sample-set. 1 means a flat layout.
    pub iterations: usize,
    /// Requests issued and discarded before measuring.
    pub warmup: usize,
    pub gps_traces: Option<PathBuf>,
    pub confidence: f64,
    pub reduction: Reduction,
    pub clock: ClockKind,
    /// Reapplied at every reseed checkpoint.
    pub seed: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            method: BenchmarkKind::Route,
            samples: 100,
            iterations: 1,
            warmup: 10,
            gps_traces: None,
            confidence: 0.95,
            reduction: Reduction::Sum,
            clock: ClockKind::Wall,
            seed: DEFAULT_SEED,
            timeout_secs: None,
        }
    }
}

impl BenchConfig {
    /// Load a scenario from YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BenchConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::Invalid("samples must be > 0".into()));
        }
        if self.iterations == 0 {
            return Err(ConfigError::Invalid("iterations must be > 0".into()));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn layout(&self) -> SampleLayout {
        SampleLayout::new(self.samples, self.iterations)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Corpus path, required for anything that generates requests.
    pub fn gps_traces(&self) -> Result<&Path, ConfigError> {
        self.gps_traces
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("a GPS traces file is required (--gps-traces)".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BenchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.layout(), SampleLayout::Flat { samples: 100 });
        assert_eq!(config.seed, 42);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_partial_scenario_uses_defaults() {
        let yaml = "method: match\nsamples: 20\niterations: 5\nreduction: mean\nclock: process\n";
        let config: BenchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.method, BenchmarkKind::Match);
        assert_eq!(config.reduction, Reduction::Mean);
        assert_eq!(config.clock, ClockKind::Process);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(
            config.layout(),
            SampleLayout::Grid {
                sample_sets: 20,
                requests_per_set: 5
            }
        );
    }

    #[test]
    fn test_unknown_method_in_scenario() {
        assert!(serde_yaml::from_str::<BenchConfig>("method: isochrone\n").is_err());
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            BenchConfig { samples: 0, ..Default::default() },
            BenchConfig { iterations: 0, ..Default::default() },
            BenchConfig { confidence: 1.0, ..Default::default() },
            BenchConfig { host: String::new(), ..Default::default() },
            BenchConfig { timeout_secs: Some(0), ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.yaml");
        std::fs::write(&path, "method: table\nhost: http://osrm:5000\ngps_traces: traces.csv.gz\n").unwrap();

        let config = BenchConfig::from_file(&path).unwrap();
        assert_eq!(config.method, BenchmarkKind::Table);
        assert_eq!(config.gps_traces().unwrap(), Path::new("traces.csv.gz"));
        assert!(BenchConfig::default().gps_traces().is_err());
        assert!(matches!(
            BenchConfig::from_file(dir.path().join("missing.yaml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
