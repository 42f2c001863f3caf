//! Fieldcast collection comparison
//!
//! Usage: `fieldcast-sim [config.json]`. Without a file the configuration
//! comes from `FIELDCAST_*` environment variables. Prints a summary to
//! stderr and the final network snapshot as JSON to stdout.

use std::env;

use fieldcast_sim::case_study::tags;
use fieldcast_sim::{Simulation, SimulationConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldcast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::from_env()?,
    };

    tracing::info!(
        devices = config.devices,
        algorithm = config.algorithm,
        end_time = config.end_time,
        "starting collection comparison"
    );

    let mut sim = Simulation::new(config)?;
    sim.run();
    let snapshot = sim.snapshot();

    eprintln!("Fieldcast collection comparison");
    eprintln!("===============================");
    eprintln!("  Time:    {:.2}", snapshot.time);
    eprintln!("  Rounds:  {}", snapshot.rounds);
    eprintln!();
    eprintln!("  Device counting");
    for (name, tag) in [
        ("ideal", tags::IDEAL_SUM),
        ("single-path", tags::SPC_SUM),
        ("multi-path", tags::MPC_SUM),
        ("weighted", tags::WMPC_SUM),
        ("list", tags::LIST_SUM),
    ] {
        eprintln!("    {name:<12} {:>10.3}", snapshot.total(tag));
    }
    eprintln!();
    eprintln!("  Progress tracking");
    let ideal = snapshot
        .devices
        .iter()
        .filter_map(|d| d.storage.get(tags::IDEAL_MAX))
        .fold(0.0f64, |a, b| a.max(*b));
    eprintln!("    {:<12} {:>10.3}", "ideal", ideal);
    for (name, tag) in [
        ("single-path", tags::SPC_MAX),
        ("multi-path", tags::MPC_MAX),
        ("weighted", tags::WMPC_MAX),
    ] {
        eprintln!("    {name:<12} {:>10.3}", snapshot.total(tag));
    }

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
