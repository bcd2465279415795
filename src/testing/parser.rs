//! TOML scenario file parsing

use bevy::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ProfilerError;
use crate::levels::GeometryDef;
use crate::search::SearchParams;
use crate::tuning::MovementTuning;

/// Complete scenario definition from TOML file
#[derive(Debug, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    pub setup: ScenarioSetup,
    #[serde(default)]
    pub params: SearchParams,
    #[serde(default)]
    pub tuning: MovementTuning,
    #[serde(default)]
    pub expect: ScenarioExpectations,
}

/// Where the search runs
#[derive(Debug, Default, Deserialize)]
pub struct ScenarioSetup {
    /// Level from the level database; inline geometry is used when absent
    pub level: Option<String>,
    pub start: Option<[f32; 2]>,
    pub goal: Option<[f32; 2]>,
    #[serde(default)]
    pub geometry: Vec<GeometrySpec>,
}

/// Inline level geometry
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometrySpec {
    Box {
        center: [f32; 2],
        size: [f32; 2],
    },
    Edge {
        a: [f32; 2],
        b: [f32; 2],
    },
    Stairs {
        origin: [f32; 2],
        count: usize,
        step: [f32; 2],
    },
}

impl From<&GeometrySpec> for GeometryDef {
    fn from(def: &GeometrySpec) -> Self {
        match *def {
            GeometrySpec::Box { center, size } => GeometryDef::Box {
                center: Vec2::from_array(center),
                size: Vec2::from_array(size),
            },
            GeometrySpec::Edge { a, b } => GeometryDef::Edge {
                a: Vec2::from_array(a),
                b: Vec2::from_array(b),
            },
            GeometrySpec::Stairs { origin, count, step } => GeometryDef::Stairs {
                origin: Vec2::from_array(origin),
                count,
                step: Vec2::from_array(step),
            },
        }
    }
}

/// Expected scenario outcomes
#[derive(Debug, Default, Deserialize)]
pub struct ScenarioExpectations {
    /// "solved" or "exhausted"
    pub status: Option<String>,
    /// Expect a configuration error instead of a result
    #[serde(default)]
    pub config_error: bool,
    /// Check strings like "nodes >= 2" or "tail.x >= 5"
    #[serde(default)]
    pub checks: Vec<String>,
}

/// Parse a scenario file from path
pub fn parse_scenario_file(path: &Path) -> Result<ScenarioDefinition, ProfilerError> {
    let content = fs::read_to_string(path).map_err(|source| ProfilerError::Io {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ProfilerError::Toml {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::InputMode;

    #[test]
    fn test_parse_basic() {
        let toml = r#"
name = "Test"
[setup]
start = [-5.0, 1.0]
goal = [5.0, 1.0]
[[setup.geometry]]
type = "box"
center = [0.0, -1.0]
size = [200.0, 2.0]

[params]
input_mode = "x_only"

[expect]
status = "solved"
checks = ["nodes = 1"]
"#;
        let def: ScenarioDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.name, "Test");
        assert_eq!(def.setup.geometry.len(), 1);
        assert_eq!(def.params.input_mode, InputMode::XOnly);
        assert_eq!(def.expect.status.as_deref(), Some("solved"));
        assert!(!def.expect.config_error);
    }

    #[test]
    fn test_geometry_spec_converts() {
        let stairs = GeometrySpec::Stairs {
            origin: [1.0, 0.0],
            count: 2,
            step: [1.0, 0.5],
        };
        assert_eq!(
            GeometryDef::from(&stairs),
            GeometryDef::Stairs {
                origin: Vec2::new(1.0, 0.0),
                count: 2,
                step: Vec2::new(1.0, 0.5)
            }
        );
    }
}
