//! Shared test utilities for the route-bench workspace.
//!
//! This crate provides common testing infrastructure including:
//! - GPS trace corpus fixtures (plain and gzip CSV)
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```

pub mod fixtures;

pub use fixtures::*;

/// Assert that two floats are within `tolerance` of each other.
///
/// An optional trailing format string names the quantity being compared:
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(point.lat, 52.516275, 1e-9);
/// assert_approx_eq!(row.mean.value, 5.5, 1e-9, "mean of {} samples", n);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $tolerance:expr $(,)?) => {
        $crate::assert_approx_eq!($actual, $expected, $tolerance, "values differ")
    };
    ($actual:expr, $expected:expr, $tolerance:expr, $($context:tt)+) => {{
        let (actual, expected, tolerance) = ($actual as f64, $expected as f64, $tolerance as f64);
        assert!(
            (actual - expected).abs() <= tolerance,
            "{}: {} vs {} (off by {}, tolerance {})",
            format_args!($($context)+),
            actual,
            expected,
            (actual - expected).abs(),
            tolerance
        );
    }};
}
