//! Platforming Profiler - profile one level (or all) and print the summary
//!
//! Usage:
//!   cargo run --bin profiler -- --help
//!   cargo run --bin profiler -- --level "Step Down" --output tree.json
//!   cargo run --bin profiler -- --all --mode x_only

use platforming_profiler::ProfilerConfig;
use platforming_profiler::profile::{init_logging, run_profiler};

fn main() {
    let config = ProfilerConfig::from_args();
    init_logging(config.quiet);

    match run_profiler(&config) {
        Ok(summaries) => {
            let solved = summaries.iter().filter(|s| s.solved()).count();
            println!("==============");
            println!("Results: {}/{} levels solved", solved, summaries.len());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
