//! Reachability sweep - sample start points around a level's start and
//! report how many reach the goal
//!
//! Usage:
//!   cargo run --bin sweep -- --level Gap --samples 64 --seed 7
//!   cargo run --bin sweep -- --level "Step Down" --spread 4 --parallel 8

use platforming_profiler::ProfilerConfig;
use platforming_profiler::profile::{init_logging, run_sweep_command};

fn main() {
    let config = ProfilerConfig::from_args();
    init_logging(config.quiet);

    if let Err(e) = run_sweep_command(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
