//! Command-line entry points shared by the binaries

use bevy::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ProfilerConfig;
use crate::error::ProfilerError;
use crate::levels::{LevelData, LevelDatabase};
use crate::report::{ProfileExport, ProfileSummary};
use crate::search::find_paths;
use crate::sweep::{SweepConfig, SweepResult, run_sweep};

/// Route Bevy's log macros to stderr without building an App.
///
/// `RUST_LOG` wins; otherwise `info`, or `warn` when quiet.
pub fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, repeated calls) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Levels selected by the config, with start/goal overrides applied
pub fn selected_levels(config: &ProfilerConfig, level_db: &LevelDatabase) -> Result<Vec<LevelData>, ProfilerError> {
    let mut levels = if config.all_levels {
        level_db.levels.clone()
    } else if let Some(name) = &config.level {
        vec![level_db.find(name)?.clone()]
    } else {
        level_db.get(0).cloned().into_iter().collect()
    };

    for level in &mut levels {
        if let Some(start) = config.start_override() {
            level.start = start;
        }
        if let Some(goal) = config.goal_override() {
            level.goal = goal;
        }
    }
    Ok(levels)
}

/// Insert the level name before the extension when exporting several levels
fn export_path(base: &str, level_name: &str, many: bool) -> String {
    if !many {
        return base.to_string();
    }
    let slug: String = level_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    match base.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, slug, ext),
        None => format!("{}_{}", base, slug),
    }
}

/// Profile every selected level; returns the summaries in level order
pub fn run_profiler(config: &ProfilerConfig) -> Result<Vec<ProfileSummary>, ProfilerError> {
    let level_db = LevelDatabase::load_from_file(&config.levels_file);
    let levels = selected_levels(config, &level_db)?;
    let many = levels.len() > 1;

    let mut summaries = Vec::with_capacity(levels.len());
    for level in &levels {
        let geometry = level.build_geometry();
        let result = find_paths(&geometry, level.start, level.goal, &config.search, &config.tuning)?;
        let summary = ProfileSummary::new(&level.name, &result);
        if !config.quiet {
            println!("{}\n", summary.format());
        }

        if let Some(base) = &config.output_file {
            let path = export_path(base, &level.name, many);
            ProfileExport::new(&level.name, &result, &config.search, &config.tuning).write_to(&path)?;
            info!("Wrote {}", path);
        }
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Reachability sweep over the first selected level
pub fn run_sweep_command(config: &ProfilerConfig) -> Result<SweepResult, ProfilerError> {
    let level_db = LevelDatabase::load_from_file(&config.levels_file);
    let levels = selected_levels(config, &level_db)?;
    let Some(level) = levels.first() else {
        return Err(ProfilerError::UnknownLevel {
            name: config.level.clone().unwrap_or_default(),
            available: level_db.names(),
        });
    };

    let sweep = SweepConfig {
        samples: config.samples,
        spread: config.spread,
        seed: config.seed.unwrap_or_else(rand::random),
        threads: config.parallel,
    };
    let result = run_sweep(
        &level.name,
        &level.build_geometry(),
        level.start,
        level.goal,
        &config.search,
        &config.tuning,
        &sweep,
    )?;
    if !config.quiet {
        println!("{}", result.format());
    }
    Ok(result)
}
