//! Clocks used to time a single request.

use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which clock times each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Monotonic wall-clock time.
    #[default]
    Wall,
    /// CPU time consumed by this process. Less sensitive to host
    /// scheduling noise; falls back to wall clock where unavailable.
    Process,
}

impl ClockKind {
    pub fn start(self) -> Stopwatch {
        match self {
            ClockKind::Wall => Stopwatch::Wall(Instant::now()),
            ClockKind::Process => match process_cpu_time() {
                Some(start) => Stopwatch::Process(start),
                None => Stopwatch::Wall(Instant::now()),
            },
        }
    }
}

/// A running measurement started by [`ClockKind::start`].
#[derive(Debug, Clone, Copy)]
pub enum Stopwatch {
    Wall(Instant),
    Process(Duration),
}

impl Stopwatch {
    /// Time since start. Never negative.
    pub fn elapsed(&self) -> Duration {
        match self {
            Stopwatch::Wall(start) => start.elapsed(),
            Stopwatch::Process(start) => process_cpu_time()
                .map(|now| now.saturating_sub(*start))
                .unwrap_or_default(),
        }
    }
}

#[cfg(unix)]
fn process_cpu_time() -> Option<Duration> {
    let mut ts = std::mem::MaybeUninit::<libc::timespec>::uninit();
    // SAFETY: clock_gettime only writes through the pointer, and `ts` is read
    // back only after it reported success.
    let ts = unsafe {
        if libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, ts.as_mut_ptr()) != 0 {
            return None;
        }
        ts.assume_init()
    };
    Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
}

#[cfg(not(unix))]
fn process_cpu_time() -> Option<Duration> {
    None
}
