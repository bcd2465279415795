//! Scenario test runner CLI
//!
//! Usage:
//!   cargo run --bin test-scenarios                       # Run all scenarios
//!   cargo run --bin test-scenarios -- ledges/            # Run category
//!   cargo run --bin test-scenarios -- --list             # List without running
//!   cargo run --bin test-scenarios -- --verbose flat_run # Expected/actual on failure

use std::path::Path;

use platforming_profiler::LevelDatabase;
use platforming_profiler::constants::LEVELS_FILE;
use platforming_profiler::profile::init_logging;
use platforming_profiler::testing::{
    SCENARIOS_DIR, TestResult, discover_scenarios, parser::parse_scenario_file, run_scenario_with,
};

struct Options {
    verbose: bool,
    list: bool,
    filter: Option<String>,
}

fn parse_options() -> Options {
    let mut options = Options {
        verbose: false,
        list: false,
        filter: None,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verbose" | "-v" => options.verbose = true,
            "--list" | "-l" => options.list = true,
            flag if flag.starts_with('-') => eprintln!("Warning: ignoring argument '{}'", flag),
            _ => options.filter = Some(arg),
        }
    }
    options
}

/// "ledges/step_down_branch" for tests/scenarios/ledges/step_down_branch.toml
fn label(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

fn run_one(path: &Path, level_db: &LevelDatabase) -> TestResult {
    match parse_scenario_file(path) {
        Ok(scenario) => run_scenario_with(&scenario, level_db),
        Err(e) => TestResult::Error { message: e.to_string() },
    }
}

fn main() {
    let options = parse_options();
    init_logging(!options.verbose);

    let base = Path::new(SCENARIOS_DIR);
    let scenarios = discover_scenarios(base, options.filter.as_deref());
    if scenarios.is_empty() {
        eprintln!(
            "No scenarios under {}{}",
            SCENARIOS_DIR,
            options.filter.map(|f| format!(" matching '{}'", f)).unwrap_or_default()
        );
        std::process::exit(1);
    }

    if options.list {
        for path in &scenarios {
            println!("{}", label(base, path));
        }
        return;
    }

    let level_db = LevelDatabase::load_from_file(LEVELS_FILE);
    let width = scenarios.iter().map(|p| label(base, p).len()).max().unwrap_or(0);

    let mut failures = Vec::new();
    for path in &scenarios {
        let name = label(base, path);
        let result = run_one(path, &level_db);
        let verdict = match &result {
            TestResult::Pass { .. } => "PASS ",
            TestResult::Fail { .. } => "FAIL ",
            TestResult::Error { .. } => "ERROR",
        };
        println!("{} {:<width$}  {}", verdict, name, result.summary(), width = width);
        if !result.passed() {
            failures.push((name, result));
        }
    }

    println!(
        "\n{} scenarios, {} passed, {} failed",
        scenarios.len(),
        scenarios.len() - failures.len(),
        failures.len()
    );

    if failures.is_empty() {
        return;
    }
    if options.verbose {
        for (name, result) in &failures {
            if let TestResult::Fail { error } = result {
                println!("\n{}:\n  {}", name, error);
            }
        }
    }
    std::process::exit(1);
}
