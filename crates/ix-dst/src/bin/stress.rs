//! Stress-test runner for the intersection monitor.
//!
//! Runs the deterministic multi-threaded harness against the real monitor
//! and reports whether every invariant held. Exits nonzero on violation so
//! it can gate CI.

use std::process;

use clap::Parser;

use ix_core::Intersection;
use ix_dst::{get_or_generate_seed, CrossingHarness, HarnessConfig};

#[derive(Parser, Debug)]
#[command(name = "ix-stress", about = "Deterministic intersection stress test")]
struct Cli {
    /// Number of vehicle threads.
    #[arg(long, default_value_t = 8)]
    vehicles: usize,

    /// Crossings per vehicle.
    #[arg(long, default_value_t = 200)]
    crossings: u64,

    /// Seed for the run (overrides DST_SEED).
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum in-intersection delay in microseconds (0 disables).
    #[arg(long, default_value_t = 100)]
    delay_max_us: u64,

    /// Emit the result as JSON instead of the one-line summary.
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let seed = match cli.seed {
        Some(seed) if seed != 0 => seed,
        Some(_) => {
            eprintln!("--seed must be nonzero");
            process::exit(2);
        }
        None => get_or_generate_seed(),
    };

    let config = HarnessConfig {
        vehicles_count: cli.vehicles,
        crossings_per_vehicle: cli.crossings,
        crossing_delay_max_us: cli.delay_max_us,
    };

    let harness = CrossingHarness::new(Intersection::new(), seed, config);
    let result = harness.run();

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize result: {err}");
                process::exit(2);
            }
        }
    } else {
        println!("{}", result.format());
    }

    if !result.all_invariants_held {
        process::exit(1);
    }
}
