//! Scenario testing for deterministic profiler runs
//!
//! Scenarios are TOML files describing a level, search settings and the
//! expected outcome of `find_paths`.

pub mod assertions;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, ProfileState, check_state, check_status};
pub use parser::{GeometrySpec, ScenarioDefinition, ScenarioExpectations, ScenarioSetup};
pub use runner::{TestResult, discover_scenarios, run_scenario_with};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";
