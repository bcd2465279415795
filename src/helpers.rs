//! Utility math shared by the stepper, the probes and the search

use bevy::prelude::*;

/// Move a value toward a target by a maximum delta
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Tangent of a surface: the normal rotated 90° counter-clockwise.
pub fn surface_tangent(normal: Vec2) -> Vec2 {
    normal.perp()
}

/// Project `v` onto `tangent`: `(v·t / |t|²) · t`.
///
/// A degenerate tangent projects everything to zero.
pub fn project_onto(v: Vec2, tangent: Vec2) -> Vec2 {
    let len_sq = tangent.length_squared();
    if len_sq <= f32::EPSILON {
        return Vec2::ZERO;
    }
    tangent * (v.dot(tangent) / len_sq)
}

/// Closest point to `p` on the segment `a..b`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest pair of points between segments `p0..p1` and `q0..q1`.
///
/// Exact for non-intersecting segments, which is the only case the sweep
/// asks about (contacts are resolved at a positive separation).
pub fn closest_points_between_segments(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> (Vec2, Vec2) {
    let candidates = [
        (p0, closest_point_on_segment(p0, q0, q1)),
        (p1, closest_point_on_segment(p1, q0, q1)),
        (closest_point_on_segment(q0, p0, p1), q0),
        (closest_point_on_segment(q1, p0, p1), q1),
    ];
    candidates
        .into_iter()
        .min_by(|a, b| a.0.distance_squared(a.1).total_cmp(&b.0.distance_squared(b.1)))
        .unwrap_or((p0, q0))
}

/// Earliest fraction `t ∈ [0, 1]` at which `origin + t * motion` comes within
/// `radius` of the segment `a..b` (a ray against a rounded segment).
///
/// Starting inside the rounded segment counts as a hit at `t = 0` only when
/// the motion heads further in; moving out is free.
pub fn sweep_point_vs_rounded_segment(
    origin: Vec2,
    motion: Vec2,
    a: Vec2,
    b: Vec2,
    radius: f32,
) -> Option<f32> {
    let closest = closest_point_on_segment(origin, a, b);
    let offset = origin - closest;
    if offset.length_squared() <= radius * radius {
        return (motion.dot(offset) < 0.0).then_some(0.0);
    }

    let mut best: Option<f32> = None;
    let mut consider = |t: f32| {
        if (0.0..=1.0).contains(&t) && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    };

    // End caps
    let motion_sq = motion.length_squared();
    if motion_sq > f32::EPSILON {
        for center in [a, b] {
            let f = origin - center;
            let half_b = f.dot(motion);
            let c = f.length_squared() - radius * radius;
            let disc = half_b * half_b - motion_sq * c;
            if disc >= 0.0 {
                consider((-half_b - disc.sqrt()) / motion_sq);
            }
        }
    }

    // Flat sides
    let ab = b - a;
    let len = ab.length();
    if len > f32::EPSILON {
        let along = ab / len;
        let normal = along.perp();
        for side in [normal, -normal] {
            let dist0 = (origin - a).dot(side);
            let rate = motion.dot(side);
            if dist0 >= radius && rate < 0.0 {
                let t = (dist0 - radius) / -rate;
                let proj = (origin + motion * t - a).dot(along);
                if (0.0..=len).contains(&proj) {
                    consider(t);
                }
            }
        }
    }

    best
}

/// Intersection distance of a ray with the segment `a..b`.
///
/// `direction` must be normalized. Parallel segments never hit.
pub fn ray_segment_distance(
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    a: Vec2,
    b: Vec2,
) -> Option<f32> {
    let edge = b - a;
    let denom = direction.perp_dot(edge);
    if denom.abs() < 1e-9 {
        return None;
    }
    let to_a = a - origin;
    let t = to_a.perp_dot(edge) / denom;
    let u = to_a.perp_dot(direction) / denom;
    if (0.0..=max_distance).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// True when `x` lies on the closed interval between `from` and `to`
/// and the two samples differ (a crossing, not a standstill).
pub fn crossed_x(from: f32, to: f32, x: f32) -> bool {
    from != to && (from - x) * (to - x) <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_move_toward_clamps() {
        assert_eq!(move_toward(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_toward(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_toward(0.0, -10.0, 3.0), -3.0);
    }

    #[test]
    fn test_project_removes_normal_component() {
        let normal = Vec2::Y;
        let v = Vec2::new(3.0, -5.0);
        let projected = project_onto(v, surface_tangent(normal));
        assert!((projected - Vec2::new(3.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_project_degenerate_tangent() {
        assert_eq!(project_onto(Vec2::new(1.0, 1.0), Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_sweep_point_hits_floor_side() {
        // Point 2 above a floor, radius 0.5, moving down 4
        let t = sweep_point_vs_rounded_segment(
            Vec2::new(0.0, 2.0),
            Vec2::new(0.0, -4.0),
            Vec2::new(-10.0, 0.0),
            Vec2::new(10.0, 0.0),
            0.5,
        )
        .unwrap();
        assert!((t - 0.375).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_point_hits_end_cap() {
        let t = sweep_point_vs_rounded_segment(
            Vec2::new(-3.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, -5.0),
            1.0,
        )
        .unwrap();
        assert!((t - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_point_inside_moving_out_is_free() {
        let hit = sweep_point_vs_rounded_segment(
            Vec2::new(0.0, 0.2),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            0.5,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_sweep_point_parallel_miss() {
        let hit = sweep_point_vs_rounded_segment(
            Vec2::new(-5.0, 1.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            0.5,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_ray_segment_distance() {
        let d = ray_segment_distance(
            Vec2::new(0.0, 3.0),
            Vec2::NEG_Y,
            10.0,
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert_eq!(d, Some(3.0));
        let miss = ray_segment_distance(
            Vec2::new(5.0, 3.0),
            Vec2::NEG_Y,
            10.0,
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        );
        assert!(miss.is_none());
    }

    #[test]
    fn test_crossed_x() {
        assert!(crossed_x(4.9, 5.1, 5.0));
        assert!(crossed_x(5.1, 4.9, 5.0));
        assert!(!crossed_x(4.0, 4.5, 5.0));
        assert!(!crossed_x(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_closest_points_between_segments() {
        let (p, q) = closest_points_between_segments(
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 3.0),
            Vec2::new(-2.0, 0.0),
            Vec2::new(2.0, 0.0),
        );
        assert_eq!(p, Vec2::new(0.0, 1.0));
        assert_eq!(q, Vec2::new(0.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_projection_is_idempotent(
            angle in 0.0f32..std::f32::consts::TAU,
            scale in -50.0f32..50.0,
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
        ) {
            let tangent = surface_tangent(Vec2::from_angle(angle));
            let along = tangent * scale;
            prop_assert!((project_onto(along, tangent) - along).length() <= 1e-4 * (1.0 + scale.abs()));

            let once = project_onto(Vec2::new(vx, vy), tangent);
            let twice = project_onto(once, tangent);
            prop_assert!((twice - once).length() <= 1e-4 * (1.0 + once.length()));
        }
    }
}
