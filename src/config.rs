//! Profiler run configuration: settings file plus command line overrides

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::LEVELS_FILE;
use crate::error::ProfilerError;
use crate::physics::InputMode;
use crate::search::SearchParams;
use crate::tuning::MovementTuning;

/// Configuration for a profiler or sweep run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Level name (None = first level in the database)
    pub level: Option<String>,
    /// Profile every level in the database
    pub all_levels: bool,
    pub levels_file: String,
    /// Overrides the level's start
    pub start: Option<[f32; 2]>,
    /// Overrides the level's goal
    pub goal: Option<[f32; 2]>,
    pub search: SearchParams,
    pub tuning: MovementTuning,
    /// Write the JSON export here (None = no export)
    pub output_file: Option<String>,
    /// Suppress the per-level report
    pub quiet: bool,
    /// Sweep: number of sampled start points
    pub samples: usize,
    /// Sweep: half-width of the horizontal band starts are drawn from
    pub spread: f32,
    /// Sweep RNG seed (None = random)
    pub seed: Option<u64>,
    /// Sweep threads (0 = rayon's default)
    pub parallel: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            level: None,
            all_levels: false,
            levels_file: LEVELS_FILE.to_string(),
            start: None,
            goal: None,
            search: SearchParams::default(),
            tuning: MovementTuning::default(),
            output_file: None,
            quiet: false,
            samples: 32,
            spread: 3.0,
            seed: None,
            parallel: 0,
        }
    }
}

/// Template profiler settings (checked into git)
pub const PROFILER_SETTINGS_TEMPLATE: &str = "config/profiler_settings.template.json";
/// Local profiler settings (gitignored, user's custom settings)
pub const PROFILER_SETTINGS_FILE: &str = "config/profiler_settings.json";

/// Parse "x,y" (or "x y")
fn parse_point(s: &str) -> Option<[f32; 2]> {
    let mut parts = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f32>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Some([x, y]),
        _ => None,
    }
}

/// Report a value that failed to parse (and so was not applied)
fn checked(flag: &str, value: &str, applied: Option<()>) {
    if applied.is_none() {
        eprintln!("Warning: invalid value '{}' for {}", value, flag);
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl ProfilerConfig {
    /// Load configuration from a JSON settings file
    pub fn from_file(path: &str) -> Result<Self, ProfilerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ProfilerError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ProfilerError::Json {
            path: path.to_string(),
            source,
        })
    }

    /// Load configuration from default config files
    /// Priority: local settings > template settings > built-in defaults
    pub fn from_config_files() -> Self {
        for path in [PROFILER_SETTINGS_FILE, PROFILER_SETTINGS_TEMPLATE] {
            match Self::from_file(path) {
                Ok(config) => return config,
                Err(ProfilerError::Io { .. }) => {}
                Err(e) => warn!("{}", e),
            }
        }
        Self::default()
    }

    /// Parse configuration from command line arguments
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.iter().any(|a| a == "--help" || a == "-h") {
            print_help();
            std::process::exit(0);
        }

        // Start with config files as base, or an explicit settings file
        let mut config = Self::from_config_files();
        if let Some(path) = args
            .windows(2)
            .find(|pair| pair[0] == "--settings")
            .map(|pair| pair[1].clone())
        {
            match Self::from_file(&path) {
                Ok(loaded) => config = loaded,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        config.apply_args(&args);
        config
    }

    /// Apply command line overrides; unknown or malformed flags are reported
    /// and ignored
    pub fn apply_args(&mut self, args: &[String]) {
        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1).map(String::as_str);
            let consumed = match (args[i].as_str(), value) {
                ("--settings", Some(_)) => true,
                ("--level", Some(v)) => {
                    self.level = Some(v.to_string());
                    true
                }
                ("--all", _) => {
                    self.all_levels = true;
                    false
                }
                ("--levels-file", Some(v)) => {
                    self.levels_file = v.to_string();
                    true
                }
                ("--start", Some(v)) => {
                    checked(args[i].as_str(), v, parse_point(v).map(|p| self.start = Some(p)));
                    true
                }
                ("--goal", Some(v)) => {
                    checked(args[i].as_str(), v, parse_point(v).map(|p| self.goal = Some(p)));
                    true
                }
                ("--mode", Some(v)) => {
                    checked(args[i].as_str(), v, InputMode::parse(v).map(|m| self.search.input_mode = m));
                    true
                }
                ("--snap", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|s| self.search.snap_threshold = s));
                    true
                }
                ("--max-time", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|t| self.search.max_simulation_time = t));
                    true
                }
                ("--branch-time", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|t| self.search.max_branch_time = t));
                    true
                }
                ("--max-nodes", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|n| self.search.max_nodes = n));
                    true
                }
                ("--jump-on-ledge", Some(v)) => {
                    checked(args[i].as_str(), v, parse_flag(v).map(|b| self.search.jump_on_ledge = b));
                    true
                }
                ("--steep-slope-jump", _) => {
                    self.search.jump_on_steep_slope = true;
                    false
                }
                ("--output", Some(v)) => {
                    self.output_file = Some(v.to_string());
                    true
                }
                ("--quiet" | "-q", _) => {
                    self.quiet = true;
                    false
                }
                ("--samples", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|n| self.samples = n));
                    true
                }
                ("--spread", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|s| self.spread = s));
                    true
                }
                ("--seed", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|s| self.seed = Some(s)));
                    true
                }
                ("--parallel", Some(v)) => {
                    checked(args[i].as_str(), v, v.parse().ok().map(|n| self.parallel = n));
                    true
                }
                (flag, _) => {
                    eprintln!("Warning: ignoring argument '{}'", flag);
                    false
                }
            };
            i += if consumed { 2 } else { 1 };
        }
    }

    pub fn start_override(&self) -> Option<Vec2> {
        self.start.map(Vec2::from_array)
    }

    pub fn goal_override(&self) -> Option<Vec2> {
        self.goal.map(Vec2::from_array)
    }
}

pub fn print_help() {
    println!(
        r#"Platforming Profiler - design-time reachability and jump timing analysis

USAGE:
    cargo run --bin profiler -- [OPTIONS]
    cargo run --bin sweep -- [OPTIONS]

OPTIONS:
    --settings <FILE>        Load settings from JSON file (CLI args override file settings)
    --level <NAME>           Level to profile (default: first level)
    --all                    Profile every level
    --levels-file <FILE>     Level definitions (default: config/levels.txt)
    --start <X,Y>            Override the level's start position
    --goal <X,Y>             Override the level's goal position
    --mode <MODE>            Input targeting: direct, eight_way, x_only, y_only
    --snap <F>               Input deadzone / snap threshold (default: 0.05)
    --max-time <SECS>        Total simulated time budget (default: 10)
    --branch-time <SECS>     Time budget per bisection trial (default: 3)
    --max-nodes <N>          Path tree node cap (default: 256)
    --jump-on-ledge <BOOL>   Jump when a ledge is detected (default: true)
    --steep-slope-jump       Jump when standing on ground steeper than the slope limit
    --output <FILE>          Write the path tree as JSON
    --quiet, -q              Suppress the per-level report
    --samples <N>            Sweep: number of sampled start points (default: 32)
    --spread <F>             Sweep: horizontal sampling half-width (default: 3)
    --seed <N>               Sweep: RNG seed for reproducibility
    --parallel <N>           Sweep: worker threads (default: all cores)
    --help, -h               Show this help

EXAMPLES:
    # Profile the step-down level and export the tree
    cargo run --bin profiler -- --level "Step Down" --output step_down.json

    # Try x-only input on every level
    cargo run --bin profiler -- --all --mode x_only

    # Reachability sweep with a fixed seed
    cargo run --bin sweep -- --level Gap --samples 64 --seed 7

SETTINGS FILE FORMAT (JSON):
    {{
      "level": "Gap",
      "search": {{ "max_simulation_time": 8.0, "input_mode": "direct" }},
      "tuning": {{ "jump_velocity": 6.5 }}
    }}

LOGGING:
    RUST_LOG=debug shows per-node and per-branch detail
"#
    );
}
