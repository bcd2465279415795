//! Assertion checking for scenario expectations

use crate::search::{SearchResult, SearchStatus};

/// Error when an assertion fails
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n    Expected: {}\n    Actual: {}", self.message, self.expected, self.actual)
    }
}

/// Flattened search outcome that checks are evaluated against
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
    pub status: SearchStatus,
    pub nodes: usize,
    pub branches: usize,
    pub degenerate: usize,
    pub max_depth: usize,
    pub frames: usize,
    pub truncated: bool,
    /// Last frame of the solution node, or of the last node recorded
    pub tail_x: f32,
    pub tail_y: f32,
    pub tail_time: f32,
    pub solution_time: Option<f32>,
    /// Every branch pivot lies strictly inside its parent segment
    pub pivots_interior: bool,
}

impl ProfileState {
    pub fn capture(result: &SearchResult) -> Self {
        let tail = result
            .solution
            .or_else(|| result.tree.iter().last().map(|node| node.id))
            .and_then(|id| result.tree.get(id))
            .map(|node| *node.segment.last());

        let pivots_interior = result.branches.iter().all(|report| {
            result
                .tree
                .get(report.parent)
                .is_some_and(|parent| report.pivot > 0 && report.pivot < parent.segment.len() - 1)
        });

        Self {
            status: result.status,
            nodes: result.tree.len(),
            branches: result.tree.branch_count(),
            degenerate: result.tree.degenerate_count(),
            max_depth: result.tree.max_depth(),
            frames: result.tree.frame_count(),
            truncated: result.truncated,
            tail_x: tail.map_or(f32::NAN, |f| f.position.x),
            tail_y: tail.map_or(f32::NAN, |f| f.position.y),
            tail_time: tail.map_or(f32::NAN, |f| f.time),
            solution_time: result.solution_time(),
            pivots_interior,
        }
    }
}

/// Parse a check string into (path, operator, value)
fn parse_check(check: &str) -> Option<(&str, &str, &str)> {
    // Try operators in order of specificity (>= before >, etc.)
    for op in &[">=", "<=", "!=", "=", ">", "<"] {
        if let Some(idx) = check.find(op) {
            let path = check[..idx].trim();
            let value = check[idx + op.len()..].trim();
            return Some((path, op, value));
        }
    }
    None
}

/// Compare the final status against "solved" / "exhausted"
pub fn check_status(expected: &str, state: &ProfileState) -> Result<(), AssertionError> {
    if state.status.name() != expected.trim().to_lowercase() {
        return Err(AssertionError {
            message: "Search status mismatch".to_string(),
            expected: expected.to_string(),
            actual: state.status.name().to_string(),
        });
    }
    Ok(())
}

/// Check state assertions against a captured profile
pub fn check_state(checks: &[String], state: &ProfileState) -> Result<(), AssertionError> {
    for check in checks {
        let (path, operator, expected_value) = parse_check(check).ok_or_else(|| AssertionError {
            message: format!("Invalid check syntax: {}", check),
            expected: "format: 'property = value' or 'tail.x > value'".to_string(),
            actual: check.clone(),
        })?;

        let actual = match path {
            "nodes" => state.nodes as f32,
            "branches" => state.branches as f32,
            "degenerate" => state.degenerate as f32,
            "max_depth" => state.max_depth as f32,
            "frames" => state.frames as f32,
            "tail.x" => state.tail_x,
            "tail.y" => state.tail_y,
            "tail.time" => state.tail_time,
            "solution_time" => state.solution_time.ok_or_else(|| AssertionError {
                message: format!("Check failed: {}", check),
                expected: "a solution".to_string(),
                actual: format!("status {}", state.status.name()),
            })?,
            "truncated" => {
                check_bool(check, state.truncated, expected_value)?;
                continue;
            }
            "pivots_interior" => {
                check_bool(check, state.pivots_interior, expected_value)?;
                continue;
            }
            _ => {
                return Err(AssertionError {
                    message: format!("Unknown property in check: {}", check),
                    expected: "nodes, branches, degenerate, max_depth, frames, tail.x, tail.y, tail.time, solution_time, truncated, pivots_interior".to_string(),
                    actual: path.to_string(),
                });
            }
        };
        check_float_comparison(path, actual, operator, expected_value)?;
    }

    Ok(())
}

fn check_bool(check: &str, actual: bool, expected_value: &str) -> Result<(), AssertionError> {
    let expected = expected_value == "true";
    if actual != expected {
        return Err(AssertionError {
            message: format!("Check failed: {}", check),
            expected: expected_value.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Check float comparison with operator
fn check_float_comparison(path: &str, actual: f32, operator: &str, expected_str: &str) -> Result<(), AssertionError> {
    let value: f32 = expected_str.trim().parse().map_err(|_| AssertionError {
        message: format!("Invalid value for {}", path),
        expected: "number".to_string(),
        actual: expected_str.to_string(),
    })?;

    let pass = match operator {
        ">=" => actual >= value,
        "<=" => actual <= value,
        ">" => actual > value,
        "<" => actual < value,
        "=" | "==" => (actual - value).abs() < 1e-3,
        "!=" => (actual - value).abs() >= 1e-3,
        _ => true, // Unknown operator, pass by default
    };

    if !pass {
        return Err(AssertionError {
            message: format!("Check failed: {} {} {} (actual: {:.3})", path, operator, expected_str, actual),
            expected: format!("{} {} {}", path, operator, value),
            actual: format!("{:.3}", actual),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ProfileState {
        ProfileState {
            status: SearchStatus::Solved,
            nodes: 4,
            branches: 1,
            degenerate: 0,
            max_depth: 2,
            frames: 300,
            truncated: false,
            tail_x: 12.05,
            tail_y: -1.999,
            tail_time: 3.2,
            solution_time: Some(3.2),
            pivots_interior: true,
        }
    }

    fn checks(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_passing_checks() {
        let list = checks(&["nodes >= 2", "branches = 1", "tail.x >= 12", "solution_time < 5", "pivots_interior = true"]);
        assert!(check_state(&list, &state()).is_ok());
        assert!(check_status("Solved", &state()).is_ok());
    }

    #[test]
    fn test_failing_check_reports_actual() {
        let err = check_state(&checks(&["nodes <= 1"]), &state()).unwrap_err();
        assert_eq!(err.actual, "4.000");
        assert!(check_status("exhausted", &state()).is_err());
    }

    #[test]
    fn test_unknown_property_and_bad_syntax() {
        assert!(check_state(&checks(&["speed > 1"]), &state()).is_err());
        assert!(check_state(&checks(&["nodes"]), &state()).is_err());
    }
}
