//! lrusim - drive the LRU cache from the command line

mod demo;
mod handler;
mod script;
mod timing;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lrucache::SharedCache;
use tracing::{info, warn};

use crate::handler::CommandHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Replay the walkthrough, printing the recency list after each step
    Demo {
        /// Cache capacity (number of items)
        #[arg(short, long, default_value_t = 4)]
        capacity: usize,
    },

    /// Execute a command script from a file, or stdin when omitted
    Run {
        /// Script path
        file: Option<PathBuf>,

        /// Cache capacity (number of items)
        #[arg(short, long, default_value_t = 4)]
        capacity: usize,
    },

    /// Check that put latency on a full cache does not grow with capacity
    Timing {
        /// Smaller capacity
        #[arg(long, default_value_t = 1_000)]
        small: usize,

        /// Larger capacity
        #[arg(long, default_value_t = 1_000_000)]
        large: usize,

        /// Timed puts per capacity
        #[arg(long, default_value_t = 100)]
        samples: u64,

        /// Allowed difference between the averages, in microseconds
        #[arg(long, default_value_t = 10.0)]
        tolerance_us: f64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match args.mode {
        Mode::Demo { capacity } => {
            info!("Running walkthrough with capacity {}", capacity);
            demo::run(capacity, io::stdout().lock())
        }
        Mode::Run { file, capacity } => run_script(file, capacity),
        Mode::Timing {
            small,
            large,
            samples,
            tolerance_us,
        } => run_timing(small, large, samples, tolerance_us),
    }
}

fn run_script(file: Option<PathBuf>, capacity: usize) -> Result<()> {
    let handler = CommandHandler::new(SharedCache::new(capacity)?);
    let stdout = io::stdout().lock();

    let summary = match &file {
        Some(path) => {
            info!("Reading script from {}", path.display());
            let input = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            handler.run(BufReader::new(input), stdout)?
        }
        None => {
            info!("Reading script from stdin");
            handler.run(io::stdin().lock(), stdout)?
        }
    };

    info!(
        "{} commands, {} rejected lines; {}",
        summary.commands,
        summary.errors,
        handler.cache().stats().snapshot()
    );
    if summary.errors > 0 {
        warn!("Script contained {} invalid lines", summary.errors);
    }
    Ok(())
}

fn run_timing(small: usize, large: usize, samples: u64, tolerance_us: f64) -> Result<()> {
    let tolerance = match Duration::try_from_secs_f64(tolerance_us / 1_000_000.0) {
        Ok(tolerance) => tolerance,
        Err(e) => bail!("invalid tolerance {}us: {}", tolerance_us, e),
    };

    info!(
        "Timing {} puts at capacities {} and {}",
        samples, small, large
    );
    let report = timing::compare(small, large, samples, tolerance)?;
    println!("{}", report);

    if !report.is_within_tolerance() {
        bail!(
            "put latency differs by {:?} between capacities {} and {}",
            report.difference(),
            small,
            large
        );
    }
    Ok(())
}
