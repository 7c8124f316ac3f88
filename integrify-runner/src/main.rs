//! Integrify replay tool
//!
//! Loads rule definitions, seeds an in-memory store, replays recorded
//! document writes through the compiled triggers and prints the resulting
//! store as JSON.
//!
//! Usage:
//!   integrify-replay --rules rules.json --seed seed.json --events events.json

use anyhow::{Result, bail};
use clap::Parser;
use integrify_runner::{Replay, load_json, parse_events};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "integrify-replay")]
#[command(about = "Replay document writes through Integrify rules")]
struct Args {
    /// JSON file with an array of rule and config definitions
    #[arg(short, long)]
    rules: PathBuf,

    /// JSON object mapping document paths to their fields
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// JSON array of {path, before, after} writes to replay
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let rules = load_json(&args.rules)?;
    let seed = args.seed.as_deref().map(load_json).transpose()?;
    let events = match &args.events {
        Some(path) => parse_events(load_json(path)?)?,
        None => Vec::new(),
    };

    let replay = Replay::new(&rules, seed.as_ref(), args.verbose)?;
    let summary = replay.run(&events).await?;
    info!(
        "Replayed {} event(s), {} trigger(s) fired, {} failed",
        summary.events, summary.fired, summary.failed
    );

    println!("{}", serde_json::to_string_pretty(&replay.store().to_json().await)?);

    if summary.failed > 0 {
        warn!("Some triggers failed; see log above");
        bail!("{} trigger invocation(s) failed", summary.failed);
    }
    Ok(())
}
