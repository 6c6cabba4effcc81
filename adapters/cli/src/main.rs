#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a scripted tactics round headlessly.

mod runner;
mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tactics_core::Event;
use tactics_system_telemetry::{Telemetry, TracingSink};
use tracing_subscriber::EnvFilter;

use crate::{
    runner::RunOptions,
    scenario::{MatchConfig, Scenario},
};

/// Plays one preparation/action round from a scripted scenario.
#[derive(Debug, Parser)]
#[command(name = "tactics", version, about)]
struct Args {
    /// Match configuration file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scenario describing characters and their planning input.
    #[arg(long)]
    scenario: PathBuf,
    /// Upper bound on simulated action-phase ticks.
    #[arg(long, default_value_t = 2_000)]
    max_ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Disables design telemetry.
    #[arg(long)]
    no_telemetry: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Entry point for the tactics command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    let scenario = Scenario::load(&args.scenario)?;
    anyhow::ensure!(args.tick_ms > 0, "--tick-ms must be positive");

    let mut telemetry = Telemetry::new(TracingSink);
    telemetry.set_enabled(!args.no_telemetry);
    telemetry.session_started();

    let summary = runner::run(
        &config,
        &scenario,
        RunOptions {
            max_ticks: args.max_ticks,
            tick: Duration::from_millis(args.tick_ms),
        },
        &mut telemetry,
    );

    for event in &summary.events {
        if !matches!(event, Event::TimeAdvanced { .. }) {
            println!("{event:?}");
        }
    }
    println!(
        "round {} after {} ticks",
        if summary.resolved { "resolved" } else { "unresolved" },
        summary.ticks
    );
    for (character, ledger, position) in &summary.characters {
        println!(
            "{character}: energy={} buffer={} position={position}",
            ledger.energy(),
            ledger.buffer_energy()
        );
    }

    telemetry.session_ended();
    if !summary.resolved {
        anyhow::bail!(
            "round did not resolve within the tick budget of {}",
            args.max_ticks
        );
    }
    Ok(())
}
