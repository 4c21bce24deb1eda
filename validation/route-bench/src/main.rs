//! Benchmark CLI for a routing HTTP service.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use route_bench::{
    BenchConfig, BenchmarkKind, ClockKind, HttpTransport, Invocation, Mode, OutputFormat, Reduction,
    SummarySink,
};

#[derive(Parser, Debug)]
#[command(name = "route-bench")]
#[command(about = "Reproducible end-to-end latency benchmark for a routing service", long_about = None)]
struct Cli {
    /// Service base URL [default: http://localhost:5000]
    #[arg(long, env = "ROUTE_BENCH_HOST")]
    host: Option<String>,

    /// Benchmark method: route, nearest, table, trip or match [default: route]
    #[arg(short, long)]
    method: Option<BenchmarkKind>,

    /// Number of samples (sample-sets) to take [default: 100]
    #[arg(short, long)]
    samples: Option<usize>,

    /// Requests per sample; 1 measures every request individually [default: 1]
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Discarded requests before measuring [default: 10]
    #[arg(short, long)]
    warmup: Option<usize>,

    /// Path to the GPS traces file (.csv or .csv.gz)
    #[arg(long = "gps-traces", visible_alias = "gps_traces")]
    gps_traces: Option<PathBuf>,

    /// Confidence level for intervals [default: 0.95]
    #[arg(long)]
    confidence: Option<f64>,

    /// How requests in one sample are combined [default: sum]
    #[arg(long, value_enum)]
    reduction: Option<Reduction>,

    /// Clock used to time requests [default: wall]
    #[arg(long, value_enum)]
    clock: Option<ClockKind>,

    /// RNG seed applied at every reseed point [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Per-request timeout in seconds; a timeout aborts the run
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Load settings from a scenario YAML file; flags override it
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Write table headers only
    #[arg(long, conflicts_with = "dump_requests")]
    headers: bool,

    /// Print the measured request URLs without contacting the service
    #[arg(long)]
    dump_requests: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> anyhow::Result<BenchConfig> {
        let mut config = match &self.scenario {
            Some(path) => BenchConfig::from_file(path)?,
            None => BenchConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(samples) = self.samples {
            config.samples = samples;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(warmup) = self.warmup {
            config.warmup = warmup;
        }
        if let Some(path) = &self.gps_traces {
            config.gps_traces = Some(path.clone());
        }
        if let Some(confidence) = self.confidence {
            config.confidence = confidence;
        }
        if let Some(reduction) = self.reduction {
            config.reduction = reduction;
        }
        if let Some(clock) = self.clock {
            config.clock = clock;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }
        Ok(config)
    }

    fn mode(&self) -> Mode {
        if self.headers {
            Mode::Headers
        } else if self.dump_requests {
            Mode::DumpRequests
        } else {
            Mode::Measure
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mode = cli.mode();
    let sink = SummarySink::from_env();
    let mut stdout = std::io::stdout().lock();
    if mode == Mode::Headers {
        route_bench::write_headers(&sink, &mut stdout)?;
        return Ok(());
    }

    let config = cli.config()?;
    let transport = HttpTransport::new(config.timeout())?;
    let invocation = Invocation {
        config,
        mode,
        output: cli.output,
        show_progress: !cli.quiet,
    };
    route_bench::execute(&invocation, &transport, &sink, &mut stdout).await?;
    Ok(())
}
