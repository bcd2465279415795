//! Search parameters (immutable for the duration of a run)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProfilerError;
use crate::physics::InputMode;

fn default_time_step() -> f32 {
    TIME_STEP
}
fn default_max_simulation_time() -> f32 {
    MAX_SIMULATION_TIME
}
fn default_max_branch_time() -> f32 {
    MAX_BRANCH_TIME
}
fn default_ledge_probe_distance() -> f32 {
    LEDGE_PROBE_DISTANCE
}
fn default_ledge_threshold() -> f32 {
    LEDGE_THRESHOLD
}
fn default_micro_steps() -> u32 {
    MICRO_STEPS
}
fn default_ground_epsilon() -> f32 {
    GROUND_EPSILON
}
fn default_grounded_hysteresis() -> f32 {
    GROUNDED_HYSTERESIS
}
fn default_true() -> bool {
    true
}
fn default_max_slope_angle() -> f32 {
    MAX_SLOPE_ANGLE
}
fn default_snap_threshold() -> f32 {
    SNAP_THRESHOLD
}
fn default_max_nodes() -> usize {
    MAX_NODES
}

/// Knobs for one `find_paths` run
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    /// Hard bound on simulated time across the whole tree
    #[serde(default = "default_max_simulation_time")]
    pub max_simulation_time: f32,
    /// Bound on each bisection re-simulation
    #[serde(default = "default_max_branch_time")]
    pub max_branch_time: f32,
    #[serde(default = "default_ledge_probe_distance")]
    pub ledge_probe_distance: f32,
    #[serde(default = "default_ledge_threshold")]
    pub ledge_threshold: f32,
    #[serde(default = "default_micro_steps")]
    pub micro_steps: u32,
    #[serde(default = "default_ground_epsilon")]
    pub ground_epsilon: f32,
    /// Top-level segments end only once a grounded change has held this long
    #[serde(default = "default_grounded_hysteresis")]
    pub grounded_hysteresis: f32,
    #[serde(default = "default_true")]
    pub jump_on_ledge: bool,
    #[serde(default)]
    pub jump_on_steep_slope: bool,
    /// Degrees from vertical beyond which ground counts as too steep
    #[serde(default = "default_max_slope_angle")]
    pub max_slope_angle: f32,
    #[serde(default)]
    pub input_mode: InputMode,
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f32,
    /// Tree size cap; reaching it ends the run as exhausted
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Keep exploring from grafted branches
    #[serde(default = "default_true")]
    pub explore_branches: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            max_simulation_time: default_max_simulation_time(),
            max_branch_time: default_max_branch_time(),
            ledge_probe_distance: default_ledge_probe_distance(),
            ledge_threshold: default_ledge_threshold(),
            micro_steps: default_micro_steps(),
            ground_epsilon: default_ground_epsilon(),
            grounded_hysteresis: default_grounded_hysteresis(),
            jump_on_ledge: true,
            jump_on_steep_slope: false,
            max_slope_angle: default_max_slope_angle(),
            input_mode: InputMode::default(),
            snap_threshold: default_snap_threshold(),
            max_nodes: default_max_nodes(),
            explore_branches: true,
        }
    }
}

fn require_positive(name: &'static str, value: f32) -> Result<(), ProfilerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProfilerError::invalid(name, format!("must be positive and finite, got {value}")))
    }
}

fn require_non_negative(name: &'static str, value: f32) -> Result<(), ProfilerError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProfilerError::invalid(name, format!("must be non-negative and finite, got {value}")))
    }
}

impl SearchParams {
    /// Fail fast on settings that would make the search meaningless
    pub fn validate(&self) -> Result<(), ProfilerError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ProfilerError::InvalidTimeStep(self.time_step));
        }
        require_positive("max_simulation_time", self.max_simulation_time)?;
        require_positive("max_branch_time", self.max_branch_time)?;
        require_non_negative("ledge_probe_distance", self.ledge_probe_distance)?;
        require_non_negative("ledge_threshold", self.ledge_threshold)?;
        require_non_negative("ground_epsilon", self.ground_epsilon)?;
        require_non_negative("grounded_hysteresis", self.grounded_hysteresis)?;
        if self.micro_steps == 0 {
            return Err(ProfilerError::invalid("micro_steps", "must be at least 1"));
        }
        if !(0.0..=90.0).contains(&self.max_slope_angle) {
            return Err(ProfilerError::invalid(
                "max_slope_angle",
                format!("must be within 0..=90 degrees, got {}", self.max_slope_angle),
            ));
        }
        if !(0.0..1.0).contains(&self.snap_threshold) {
            return Err(ProfilerError::invalid(
                "snap_threshold",
                format!("must be within 0..1, got {}", self.snap_threshold),
            ));
        }
        if self.max_nodes == 0 {
            return Err(ProfilerError::invalid("max_nodes", "must be at least 1"));
        }
        Ok(())
    }

    /// Upper bound on frames a single segment can hold
    pub fn max_steps(&self) -> usize {
        (self.max_simulation_time / self.time_step).ceil() as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SearchParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_time_step_is_configuration_error() {
        let params = SearchParams {
            time_step: 0.0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ProfilerError::InvalidTimeStep(_))));
        let params = SearchParams {
            time_step: -0.1,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(ProfilerError::InvalidTimeStep(_))));
    }

    #[test]
    fn test_zero_micro_steps_rejected() {
        let params = SearchParams {
            micro_steps: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_hysteresis_rejected() {
        let params = SearchParams {
            grounded_hysteresis: -0.01,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ProfilerError::InvalidParameter {
                name: "grounded_hysteresis",
                ..
            })
        ));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let params: SearchParams = toml::from_str("input_mode = \"x_only\"\nmax_nodes = 12").unwrap();
        assert_eq!(params.input_mode, InputMode::XOnly);
        assert_eq!(params.max_nodes, 12);
        assert_eq!(params.time_step, TIME_STEP);
        assert!(params.jump_on_ledge);
    }
}
