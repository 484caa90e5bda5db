// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Notescan: batch page rectifier for photographed handwritten notes.
//
// Entry point. Initialises logging, builds the scanner configuration from
// flags and an optional JSON file, and rectifies every input on a bounded
// pool of blocking workers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use notescan_core::{
    BatchReport, FailedScan, FailureKind, OutputSize, ScanConfig, ScanReport, Strategy,
};
use notescan_scan::DocumentScanner;
use notescan_scan::pipeline::failed_scan;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

type CliError = Box<dyn std::error::Error + Send + Sync>;
type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(name = "notescan")]
#[command(about = "Rectify photographs of handwritten pages into flat, size-bounded JPEGs")]
#[command(version)]
struct Cli {
    /// Page photographs to rectify.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the `scan_<name>.jpg` files are written to.
    #[arg(long, default_value = "processed")]
    out_dir: PathBuf,

    /// JSON scanner configuration; flags below override it.
    #[arg(long, conflicts_with = "as_observed")]
    config: Option<PathBuf>,

    /// Pin the output width in pixels.
    #[arg(long, conflicts_with = "target_height")]
    target_width: Option<u32>,

    /// Pin the output height in pixels.
    #[arg(long)]
    target_height: Option<u32>,

    /// Encoded size budget in KiB.
    #[arg(long)]
    budget_kb: Option<u32>,

    /// Page boundary strategy.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Start from the first-release settings (height 842, nearest-corner selection).
    #[arg(long)]
    as_observed: bool,

    /// Pages processed concurrently (default: available parallelism).
    #[arg(long)]
    jobs: Option<usize>,

    /// Write the batch report (JSON) to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Geometric,
    BoundaryScan,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Geometric => Strategy::Geometric,
            StrategyArg::BoundaryScan => Strategy::BoundaryScan,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "notescan aborted");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> CliResult<ExitCode> {
    let config = build_config(&cli)?;
    let scanner = Arc::new(DocumentScanner::new(config)?);
    let jobs = cli.jobs.unwrap_or_else(default_jobs).max(1);
    info!(inputs = cli.inputs.len(), jobs, out_dir = %cli.out_dir.display(), "Notescan starting");

    let report = run_batch(scanner, cli.inputs.clone(), cli.out_dir.clone(), jobs).await?;

    for failure in &report.failed {
        eprintln!("{}: {}", failure.input.display(), failure.message);
    }
    println!("processed {}, failed {}", report.processed(), report.failed());

    if let Some(path) = &cli.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!(path = %path.display(), "Batch report written");
    }

    if report.processed() == 0 && report.failed() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Base settings (preset or file) with command-line overrides applied.
fn build_config(cli: &Cli) -> CliResult<ScanConfig> {
    let mut config = match (&cli.config, cli.as_observed) {
        (Some(path), _) => ScanConfig::load(path)?,
        (None, true) => ScanConfig::as_observed(),
        (None, false) => ScanConfig::default(),
    };

    if let Some(width) = cli.target_width {
        config.output_size = OutputSize::TargetWidth(width);
    }
    if let Some(height) = cli.target_height {
        config.output_size = OutputSize::TargetHeight(height);
    }
    if let Some(budget) = cli.budget_kb {
        config.size_budget_kb = budget;
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    config.validate()?;
    Ok(config)
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Scan every input on a blocking worker, at most `jobs` at a time. The
/// report lists pages in input order.
async fn run_batch(
    scanner: Arc<DocumentScanner>,
    inputs: Vec<PathBuf>,
    out_dir: PathBuf,
    jobs: usize,
) -> CliResult<BatchReport> {
    let permits = Arc::new(Semaphore::new(jobs));
    let mut workers = JoinSet::new();

    for (index, input) in inputs.iter().cloned().enumerate() {
        let permit = Arc::clone(&permits).acquire_owned().await?;
        let scanner = Arc::clone(&scanner);
        let out_dir = out_dir.clone();
        workers.spawn_blocking(move || {
            let _permit = permit;
            let outcome = scanner
                .scan_file(&input, &out_dir)
                .map_err(|err| failed_scan(&input, &err));
            (index, outcome)
        });
    }

    let mut outcomes: Vec<Option<Result<ScanReport, FailedScan>>> = vec![None; inputs.len()];
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(err) => error!(error = %err, "Scan worker did not finish"),
        }
    }

    let mut report = BatchReport::default();
    for (input, outcome) in inputs.into_iter().zip(outcomes) {
        match outcome {
            Some(Ok(scan)) => report.succeeded.push(scan),
            Some(Err(failure)) => report.failed.push(failure),
            None => report.failed.push(FailedScan {
                input,
                kind: FailureKind::Io,
                message: "scan worker did not finish".to_string(),
            }),
        }
    }
    info!(
        processed = report.processed(),
        failed = report.failed(),
        "Batch finished"
    );
    Ok(report)
}
