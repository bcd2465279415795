//! Level database - parsing and storage

use bevy::prelude::*;
use std::fs;

use crate::error::ProfilerError;

/// Solid geometry in level data
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryDef {
    Box { center: Vec2, size: Vec2 },
    Edge { a: Vec2, b: Vec2 },
    /// `count` steps rising to the right from `origin`, each `step` in size
    Stairs { origin: Vec2, count: usize, step: Vec2 },
}

/// Single level definition
#[derive(Clone, Debug, PartialEq)]
pub struct LevelData {
    pub name: String,
    /// Agent center at the start of the search
    pub start: Vec2,
    pub goal: Vec2,
    pub geometry: Vec<GeometryDef>,
}

impl LevelData {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Vec2::new(-5.0, 1.0), // default
            goal: Vec2::new(5.0, 1.0),   // default
            geometry: Vec::new(),
        }
    }
}

/// Database of all loaded levels
#[derive(Resource, Default, Debug, Clone)]
pub struct LevelDatabase {
    pub levels: Vec<LevelData>,
}

/// Parse exactly `N` whitespace-separated floats
fn parse_floats<const N: usize>(params: &str) -> Option<[f32; N]> {
    let parts: Vec<&str> = params.split_whitespace().collect();
    if parts.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse::<f32>().ok()?;
    }
    Some(out)
}

impl LevelDatabase {
    /// Load levels from file, returns default hardcoded levels on error
    pub fn load_from_file(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!("Failed to load levels from {}: {}, using defaults", path, e);
                Self::default_levels()
            }
        }
    }

    /// Parse level data from string
    pub fn parse(content: &str) -> Self {
        let mut levels = Vec::new();
        let mut current_level: Option<LevelData> = None;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("level:") {
                if let Some(level) = current_level.take() {
                    levels.push(level);
                }
                current_level = Some(LevelData::named(name.trim()));
                continue;
            }

            let Some(level) = &mut current_level else {
                debug!("Line {} outside any level, ignored", line_no + 1);
                continue;
            };

            let parsed = if let Some(params) = line.strip_prefix("start:") {
                parse_floats::<2>(params).map(|[x, y]| level.start = Vec2::new(x, y))
            } else if let Some(params) = line.strip_prefix("goal:") {
                parse_floats::<2>(params).map(|[x, y]| level.goal = Vec2::new(x, y))
            } else if let Some(params) = line.strip_prefix("box:") {
                parse_floats::<4>(params).map(|[x, y, w, h]| {
                    level.geometry.push(GeometryDef::Box {
                        center: Vec2::new(x, y),
                        size: Vec2::new(w, h),
                    })
                })
            } else if let Some(params) = line.strip_prefix("edge:") {
                parse_floats::<4>(params).map(|[ax, ay, bx, by]| {
                    level.geometry.push(GeometryDef::Edge {
                        a: Vec2::new(ax, ay),
                        b: Vec2::new(bx, by),
                    })
                })
            } else if let Some(params) = line.strip_prefix("stairs:") {
                parse_floats::<5>(params).map(|[x, y, count, w, h]| {
                    level.geometry.push(GeometryDef::Stairs {
                        origin: Vec2::new(x, y),
                        count: count.max(0.0) as usize,
                        step: Vec2::new(w, h),
                    })
                })
            } else {
                None
            };

            if parsed.is_none() {
                warn!("Skipping malformed level line {}: '{}'", line_no + 1, line);
            }
        }

        // Don't forget the last level
        if let Some(level) = current_level {
            levels.push(level);
        }

        if levels.is_empty() {
            warn!("No levels parsed, using defaults");
            return Self::default_levels();
        }

        info!("Loaded {} levels from file", levels.len());
        Self { levels }
    }

    /// Hardcoded fallback levels
    pub fn default_levels() -> Self {
        let floor = |x: f32, width: f32, top: f32| GeometryDef::Box {
            center: Vec2::new(x, top - 1.0),
            size: Vec2::new(width, 2.0),
        };
        Self {
            levels: vec![
                LevelData {
                    name: "Flat".to_string(),
                    start: Vec2::new(-5.0, 1.0),
                    goal: Vec2::new(5.0, 0.0),
                    geometry: vec![floor(0.0, 60.0, 0.0)],
                },
                LevelData {
                    name: "Step Down".to_string(),
                    start: Vec2::new(-5.0, 1.0),
                    goal: Vec2::new(12.0, -2.0),
                    geometry: vec![
                        GeometryDef::Box {
                            center: Vec2::new(-10.0, -1.5),
                            size: Vec2::new(20.0, 3.0),
                        },
                        floor(15.0, 30.0, -3.0),
                    ],
                },
                LevelData {
                    name: "Gap".to_string(),
                    start: Vec2::new(-5.0, 1.0),
                    goal: Vec2::new(10.0, 1.0),
                    geometry: vec![floor(-10.0, 20.0, 0.0), floor(13.0, 20.0, 0.0)],
                },
                LevelData {
                    name: "Stairs".to_string(),
                    start: Vec2::new(-5.0, 1.0),
                    goal: Vec2::new(12.0, 2.2),
                    geometry: vec![
                        floor(-5.0, 30.0, 0.0),
                        GeometryDef::Stairs {
                            origin: Vec2::new(0.0, 0.0),
                            count: 3,
                            step: Vec2::new(1.5, 0.4),
                        },
                        floor(9.5, 10.0, 1.2),
                    ],
                },
            ],
        }
    }

    /// Get level by index
    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    /// Case-insensitive lookup by name
    pub fn find(&self, name: &str) -> Result<&LevelData, ProfilerError> {
        self.levels
            .iter()
            .find(|level| level.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ProfilerError::UnknownLevel {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.levels.iter().map(|level| level.name.clone()).collect()
    }

    /// Get number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
# two levels
level: Ramp
start: -3 1
goal: 8 2.5
box: 0 -1 40 2
edge: 2 0 6 1.5

level: Broken
box: 0 -1 nope 2
stairs: 0 0 3 1.5 0.4
";

    #[test]
    fn test_parse_levels() {
        let db = LevelDatabase::parse(SAMPLE);
        assert_eq!(db.len(), 2);
        let ramp = db.find("ramp").unwrap();
        assert_eq!(ramp.start, Vec2::new(-3.0, 1.0));
        assert_eq!(ramp.goal, Vec2::new(8.0, 2.5));
        assert_eq!(ramp.geometry.len(), 2);
        assert_eq!(
            ramp.geometry[1],
            GeometryDef::Edge {
                a: Vec2::new(2.0, 0.0),
                b: Vec2::new(6.0, 1.5)
            }
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let db = LevelDatabase::parse(SAMPLE);
        let broken = db.find("Broken").unwrap();
        assert_eq!(broken.geometry.len(), 1);
        assert!(matches!(broken.geometry[0], GeometryDef::Stairs { count: 3, .. }));
        // Defaults survive when not overridden
        assert_eq!(broken.start, Vec2::new(-5.0, 1.0));
    }

    #[test]
    fn test_empty_input_falls_back_to_defaults() {
        let db = LevelDatabase::parse("# nothing here\n");
        assert_eq!(db.names(), LevelDatabase::default_levels().names());
    }

    #[test]
    fn test_unknown_level_lists_available() {
        let db = LevelDatabase::default_levels();
        match db.find("Moon") {
            Err(ProfilerError::UnknownLevel { available, .. }) => assert_eq!(available.len(), 4),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
