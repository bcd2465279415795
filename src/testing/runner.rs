//! Scenario execution engine

use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::levels::{LevelData, LevelDatabase};
use crate::search::find_paths;

use super::assertions::{AssertionError, ProfileState, check_state, check_status};
use super::parser::ScenarioDefinition;

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    /// `state` is None when the expected configuration error was raised
    Pass { state: Option<ProfileState> },
    Fail { error: AssertionError },
    Error { message: String },
}

impl TestResult {
    pub fn passed(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    /// One line describing what the search did (or why the scenario failed)
    pub fn summary(&self) -> String {
        match self {
            TestResult::Pass { state: Some(state) } => {
                let mut line = format!(
                    "{}: {} nodes, {} branches, depth {}, {} frames",
                    state.status.name(),
                    state.nodes,
                    state.branches,
                    state.max_depth,
                    state.frames
                );
                if state.degenerate > 0 {
                    line.push_str(&format!(", {} degenerate", state.degenerate));
                }
                if state.truncated {
                    line.push_str(", truncated");
                }
                line
            }
            TestResult::Pass { state: None } => "rejected by validation".to_string(),
            TestResult::Fail { error } => error.message.clone(),
            TestResult::Error { message } => message.clone(),
        }
    }
}

/// Resolve the scenario's level: inline geometry wins, then a named level
fn resolve_level(scenario: &ScenarioDefinition, level_db: &LevelDatabase) -> Result<LevelData, String> {
    let setup = &scenario.setup;
    let mut level = if !setup.geometry.is_empty() {
        LevelData {
            name: scenario.name.clone(),
            start: Vec2::new(-5.0, 1.0),
            goal: Vec2::new(5.0, 1.0),
            geometry: setup.geometry.iter().map(Into::into).collect(),
        }
    } else if let Some(name) = &setup.level {
        level_db.find(name).map_err(|e| e.to_string())?.clone()
    } else {
        return Err("scenario needs either setup.level or setup.geometry".to_string());
    };

    if let Some(start) = setup.start {
        level.start = Vec2::from_array(start);
    }
    if let Some(goal) = setup.goal {
        level.goal = Vec2::from_array(goal);
    }
    Ok(level)
}

/// Run a single scenario; named levels are looked up in `level_db`
pub fn run_scenario_with(scenario: &ScenarioDefinition, level_db: &LevelDatabase) -> TestResult {
    let level = match resolve_level(scenario, level_db) {
        Ok(level) => level,
        Err(message) => return TestResult::Error { message },
    };
    let geometry = level.build_geometry();

    let result = find_paths(&geometry, level.start, level.goal, &scenario.params, &scenario.tuning);
    let expect = &scenario.expect;

    let result = match (result, expect.config_error) {
        (Err(e), true) => {
            debug!("scenario '{}' rejected as expected: {}", scenario.name, e);
            return TestResult::Pass { state: None };
        }
        (Ok(result), true) => {
            return TestResult::Fail {
                error: AssertionError {
                    message: "Expected a configuration error".to_string(),
                    expected: "configuration error".to_string(),
                    actual: format!("search {} with {} nodes", result.status.name(), result.tree.len()),
                },
            };
        }
        (Err(e), false) => {
            return TestResult::Error {
                message: e.to_string(),
            };
        }
        (Ok(result), false) => result,
    };

    let state = ProfileState::capture(&result);
    if let Some(status) = &expect.status {
        if let Err(error) = check_status(status, &state) {
            return TestResult::Fail { error };
        }
    }
    if let Err(error) = check_state(&expect.checks, &state) {
        return TestResult::Fail { error };
    }

    TestResult::Pass { state: Some(state) }
}

/// Find scenario files under `base` whose relative path contains `filter`
pub fn discover_scenarios(base: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut scenarios = Vec::new();
    discover_recursive(base, base, filter, &mut scenarios);
    scenarios.sort();
    scenarios
}

fn discover_recursive(base: &Path, current: &Path, filter: Option<&str>, scenarios: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(current) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            discover_recursive(base, &path, filter, scenarios);
        } else if path.extension().is_some_and(|e| e == "toml") {
            if let Some(f) = filter {
                let rel = path.strip_prefix(base).unwrap_or(&path).to_string_lossy();
                if !rel.contains(f) {
                    continue;
                }
            }
            scenarios.push(path);
        }
    }
}
