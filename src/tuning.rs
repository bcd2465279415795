//! Movement tuning for the profiled character (decoupled from search settings)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProfilerError;
use crate::world::ShapeDef;

fn default_gravity() -> [f32; 2] {
    GRAVITY.to_array()
}
fn default_max_fall_speed() -> f32 {
    MAX_FALL_SPEED
}
fn default_coyote_time() -> f32 {
    COYOTE_TIME
}

/// Serializable movement values; the same numbers live gameplay code tunes
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 2],
    pub move_speed: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
    pub jump_velocity: f32,
    #[serde(default = "default_max_fall_speed")]
    pub max_fall_speed: f32,
    #[serde(default = "default_coyote_time")]
    pub coyote_time: f32,
    #[serde(default)]
    pub shape: ShapeDef,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            move_speed: MOVE_SPEED,
            ground_accel: GROUND_ACCEL,
            air_accel: AIR_ACCEL,
            jump_velocity: JUMP_VELOCITY,
            max_fall_speed: default_max_fall_speed(),
            coyote_time: default_coyote_time(),
            shape: ShapeDef::default(),
        }
    }
}

impl MovementTuning {
    pub fn gravity(&self) -> Vec2 {
        Vec2::from_array(self.gravity)
    }

    pub fn validate(&self) -> Result<(), ProfilerError> {
        if !self.gravity().is_finite() {
            return Err(ProfilerError::invalid("tuning.gravity", "must be finite"));
        }
        for (name, value) in [
            ("tuning.move_speed", self.move_speed),
            ("tuning.ground_accel", self.ground_accel),
            ("tuning.air_accel", self.air_accel),
            ("tuning.jump_velocity", self.jump_velocity),
            ("tuning.max_fall_speed", self.max_fall_speed),
            ("tuning.coyote_time", self.coyote_time),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ProfilerError::invalid(name, format!("must be finite and non-negative, got {value}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(MovementTuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "move_speed": 6.0, "ground_accel": 40.0, "air_accel": 20.0, "jump_velocity": 7.0 }"#;
        let tuning: MovementTuning = serde_json::from_str(json).unwrap();
        assert_eq!(tuning.move_speed, 6.0);
        assert_eq!(tuning.gravity(), GRAVITY);
        assert_eq!(tuning.coyote_time, COYOTE_TIME);
        assert_eq!(tuning.shape, ShapeDef::default());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let tuning = MovementTuning {
            move_speed: -1.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }
}
