use std::num::NonZeroU32;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use heapfill::progress::ConsoleSink;
use heapfill::{FillConfig, FillDriver};

/// Default block size, matching the roughly 4 MB arrays of the classic demo.
const DEFAULT_BLOCK_BYTES: usize = 4 * 1024 * 1024;

/// Default budget, small enough that the demo exhausts within moments.
const DEFAULT_BUDGET_BYTES: usize = 64 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "heapfill", about = "Memory-pressure demos against a deterministic byte budget")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Allocate and retain fixed-size blocks until the byte budget is exhausted.
    Fill {
        /// Bytes per block.
        #[arg(long, env = "HEAPFILL_BLOCK_BYTES", default_value_t = DEFAULT_BLOCK_BYTES)]
        block_bytes: usize,
        /// Total byte budget for the run.
        #[arg(long, env = "HEAPFILL_BUDGET_BYTES", default_value_t = DEFAULT_BUDGET_BYTES)]
        budget_bytes: usize,
        /// Collect and print a usage profile after the run.
        #[arg(long)]
        profile: bool,
    },
    /// Print the multiples of a step below a limit from a lazy pipeline.
    Multiples {
        /// Step between reported values.
        #[arg(long, default_value = "5")]
        step: NonZeroU32,
        /// Exclusive upper bound of the scanned range.
        #[arg(long, default_value_t = 10_000)]
        limit: u32,
    },
}

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries only the demo's own output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fill {
            block_bytes,
            budget_bytes,
            profile,
        } => run_fill(block_bytes, budget_bytes, profile)?,
        Commands::Multiples { step, limit } => run_multiples(step, limit),
    }

    Ok(())
}

fn run_fill(block_bytes: usize, budget_bytes: usize, profile: bool) -> Result<()> {
    let mut config = FillConfig::new(block_bytes, budget_bytes);
    if profile {
        config = config.with_profile();
    }

    let driver = FillDriver::new(config).context("invalid fill configuration")?;
    let mut sink = ConsoleSink;
    let report = driver.run(&mut sink);

    info!(
        blocks = report.blocks_allocated,
        bytes_used = report.bytes_used,
        peak_bytes = report.peak_bytes,
        "fill run complete"
    );

    if let Some(profile) = &report.profile {
        eprintln!("{}", profile.report());
    }

    Ok(())
}

fn run_multiples(step: NonZeroU32, limit: u32) {
    for n in heapfill::pipeline::multiples_of(step, limit) {
        println!("{n}");
    }
}
