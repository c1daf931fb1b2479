#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Gridsiege battle headlessly.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use gridsiege_core::Event;
use gridsiege_simulation::{Outcome, Simulation, SimulationConfig, SimulationStatus};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Runs a Gridsiege battle without a display and reports how it went.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file overriding the default tunables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the random source; overrides the configured one.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum number of ticks to simulate.
    #[arg(short, long, default_value_t = 12_000)]
    ticks: u64,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Only print the final summary.
    #[arg(short, long)]
    quiet: bool,
}

/// Entry point for the Gridsiege command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    info!(seed = config.seed, ticks = args.ticks, "starting battle");

    let mut simulation = Simulation::new(config).context("invalid simulation configuration")?;
    let dt = Duration::from_millis(args.tick_ms);
    for _ in 0..args.ticks {
        for event in simulation.tick(dt) {
            report(&event);
        }
        if simulation.outcome().is_some() {
            break;
        }
    }

    print_summary(&simulation.status());
    Ok(())
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "gridsiege=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    SimulationConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn report(event: &Event) {
    match event {
        Event::EntityDied {
            entity, faction, ..
        } => info!(entity = entity.get(), ?faction, "entity died"),
        Event::AreaEffectCast { center, victims } => {
            info!(?center, victims, "area effect cast");
        }
        Event::DefendersHealed { count } => info!(count, "defenders healed"),
        other => debug!(event = ?other),
    }
}

fn print_summary(status: &SimulationStatus) {
    let outcome = match status.outcome {
        Some(Outcome::Victory) => "victory",
        Some(Outcome::Defeat) => "defeat",
        None => "undecided",
    };
    println!("outcome:    {outcome}");
    println!(
        "level:      {} (wave {}/{})",
        status.level, status.wave, status.waves_per_level
    );
    println!("gold:       {}", status.gold);
    println!(
        "rosters:    {} defenders, {} invaders, {} queued",
        status.defenders, status.invaders, status.queued
    );
    println!(
        "stats:      {} kills, {} gold spent, peak threat x{:.2}, {} ticks",
        status.stats.kills, status.stats.gold_spent, status.stats.peak_threat, status.stats.ticks
    );
}
