//! Reachability sweep: many independent searches from sampled start points
//!
//! Each sample owns its own search, so samples run in parallel with Rayon.
//! Sampling is seeded, which keeps a sweep reproducible for a given seed.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::constants::GROUND_EPSILON;
use crate::error::ProfilerError;
use crate::search::{SearchParams, SearchStatus, find_paths};
use crate::tuning::MovementTuning;
use crate::world::{CollisionProbe, LevelGeometry};

/// Outcome of one sampled start point
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSample {
    pub start: Vec2,
    pub status: SearchStatus,
    pub nodes: usize,
    pub solution_time: Option<f32>,
}

/// Result of a reachability sweep for a single level
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub level_name: String,
    pub seed: u64,
    pub goal: Vec2,
    pub samples: Vec<SweepSample>,
}

impl SweepResult {
    pub fn solved(&self) -> usize {
        self.samples.iter().filter(|s| s.status == SearchStatus::Solved).count()
    }

    pub fn solve_rate(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.solved() as f32 / self.samples.len() as f32
    }

    /// Format result for console output
    pub fn format(&self) -> String {
        let mut out = format!(
            "SWEEP: {} (seed {}, {} samples, goal ({:.1}, {:.1}))\n  SOLVED: {}/{} ({:.0}%)",
            self.level_name,
            self.seed,
            self.samples.len(),
            self.goal.x,
            self.goal.y,
            self.solved(),
            self.samples.len(),
            self.solve_rate() * 100.0
        );

        let failures: Vec<&SweepSample> = self
            .samples
            .iter()
            .filter(|s| s.status != SearchStatus::Solved)
            .collect();
        for f in failures.iter().take(5) {
            out.push_str(&format!(
                "\n  UNSOLVED: start ({:.2}, {:.2}) - {} nodes",
                f.start.x, f.start.y, f.nodes
            ));
        }
        if failures.len() > 5 {
            out.push_str(&format!("\n  ... and {} more", failures.len() - 5));
        }
        out
    }
}

/// Draw `count` start points within `spread` of `around` horizontally,
/// each dropped onto the ground below it when there is any
pub fn sample_starts(
    probe: &dyn CollisionProbe,
    around: Vec2,
    spread: f32,
    half_height: f32,
    count: usize,
    seed: u64,
) -> Vec<Vec2> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = if spread > 0.0 {
                rng.gen_range(around.x - spread..=around.x + spread)
            } else {
                around.x
            };
            let above = Vec2::new(x, around.y + half_height);
            probe
                .cast_down(above, half_height * 4.0)
                .map(|hit| Vec2::new(x, hit.point.y + half_height + GROUND_EPSILON))
                .unwrap_or(Vec2::new(x, around.y))
        })
        .collect()
}

/// Settings for one sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub samples: usize,
    pub spread: f32,
    pub seed: u64,
    /// Worker threads (0 = Rayon's default)
    pub threads: usize,
}

/// Run `find_paths` from every sampled start, in parallel
pub fn run_sweep(
    level_name: &str,
    geometry: &LevelGeometry,
    start: Vec2,
    goal: Vec2,
    params: &SearchParams,
    tuning: &MovementTuning,
    config: &SweepConfig,
) -> Result<SweepResult, ProfilerError> {
    params.validate()?;
    let half_height = tuning.shape.build()?.half_height();
    let starts = sample_starts(geometry, start, config.spread, half_height, config.samples, config.seed);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let samples = pool.install(|| {
        starts
            .par_iter()
            .map(|&sample| {
                let result = find_paths(geometry, sample, goal, params, tuning)?;
                Ok(SweepSample {
                    start: sample,
                    status: result.status,
                    nodes: result.tree.len(),
                    solution_time: result.solution_time(),
                })
            })
            .collect::<Result<Vec<_>, ProfilerError>>()
    })?;

    info!(
        "sweep of {} finished: {}/{} solved",
        level_name,
        samples.iter().filter(|s| s.status == SearchStatus::Solved).count(),
        samples.len()
    );

    Ok(SweepResult {
        level_name: level_name.to_string(),
        seed: config.seed,
        goal,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> LevelGeometry {
        LevelGeometry::new().with_box(Vec2::new(0.0, -1.0), Vec2::new(200.0, 2.0))
    }

    #[test]
    fn test_sampling_is_seeded() {
        let geometry = floor();
        let a = sample_starts(&geometry, Vec2::new(-5.0, 1.0), 2.0, 1.0, 8, 42);
        let b = sample_starts(&geometry, Vec2::new(-5.0, 1.0), 2.0, 1.0, 8, 42);
        assert_eq!(a, b);
        for start in &a {
            assert!((start.x + 5.0).abs() <= 2.0);
            assert!((start.y - 1.0 - GROUND_EPSILON).abs() < 1e-5);
        }
    }

    #[test]
    fn test_flat_sweep_solves_everything() {
        let config = SweepConfig {
            samples: 6,
            spread: 2.0,
            seed: 7,
            threads: 2,
        };
        let result = run_sweep(
            "Flat",
            &floor(),
            Vec2::new(-5.0, 1.0),
            Vec2::new(5.0, 1.0),
            &SearchParams::default(),
            &MovementTuning::default(),
            &config,
        )
        .unwrap();
        assert_eq!(result.samples.len(), 6);
        assert_eq!(result.solve_rate(), 1.0);
        assert!(result.format().contains("SOLVED: 6/6"));
    }

    #[test]
    fn test_empty_sweep_rate_is_zero() {
        let result = SweepResult {
            level_name: "None".to_string(),
            seed: 0,
            goal: Vec2::ZERO,
            samples: Vec::new(),
        };
        assert_eq!(result.solve_rate(), 0.0);
    }
}
