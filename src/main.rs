use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use tcx2tsv::options::SegmentOptions;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Summarise a TCX track as ~100 m legs in a TSV table (written to <INPUT>.tsv)",
    long_about = None
)]
struct Cli {
    /// TCX file to read
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Also emit the trailing leg that never reached 100 m
    #[arg(long, action = ArgAction::SetTrue)]
    flush_partial_leg: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let opts = SegmentOptions {
        flush_partial_leg: cli.flush_partial_leg,
    };
    debug!(?opts, input = %cli.input.display(), "Starting conversion");

    let (_, summary) = tcx2tsv::convert_file(&cli.input, &opts)
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;

    if let Some(leg) = summary.dropped {
        info!(
            points = leg.lap_points,
            distance = leg.distance,
            "Trailing partial leg not written (use --flush-partial-leg to keep it)"
        );
    }
    Ok(())
}
