//! Herd Simulation Benchmark
//!
//! Runs ten years of monthly steps from the default herd, or from a JSON
//! configuration passed as the first argument.

use anyhow::Context;
use herd::{HerdConfig, HerdSimulation};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const TICKS: u64 = 120;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Herd Simulation Engine starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading herd configuration {}", path))?;
            HerdConfig::from_json_str(&json).with_context(|| format!("parsing herd configuration {}", path))?
        }
        None => HerdConfig::default(),
    };

    let mut sim = HerdSimulation::new(&config)?;
    info!("Initial herd built. Population: {}", sim.population());
    for (class, summary) in sim.herd.summary() {
        info!("  {:?}: {} head, {:.0} kg", class, summary.count, summary.total_weight);
    }

    info!("Running 10 year benchmark ({} ticks)...", TICKS);
    let start = std::time::Instant::now();
    let results = sim.run(TICKS)?;
    let elapsed = start.elapsed();

    let births: u32 = results.iter().map(|r| r.births).sum();
    let deaths: u32 = results.iter().map(|r| r.deaths).sum();
    info!(
        "Benchmark complete: {:?} total, {:?} per tick, {} births, {} deaths, {} final population",
        elapsed,
        elapsed / TICKS as u32,
        births,
        deaths,
        sim.population()
    );

    let events = sim.finish();
    info!("{} events raised at end of run", events.len());

    Ok(())
}
