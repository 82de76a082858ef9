//! Adaptive cubic Bezier tessellation.
//!
//! Curves are flattened in two stages. [`flatten`] first cuts each cubic at
//! its horizontal and vertical extrema and at the curvature extremum, so
//! cusps and loops never reach the recursive stage; [`tessellate`] then
//! subdivides each smooth monotone piece until it satisfies a flatness
//! bound and, when stroking, an angular bound that keeps the sagitta of the
//! remaining turn under the flatness tolerance at half-stroke radius.

use crate::basics::Point;
use crate::math::{cross, dot, lerp, normalized, quadratic_roots_in_unit, segment_distance_squared};
use crate::path::{BezierPath, LinePath};

/// Flattening tolerance in pixels.
pub const TOLERANCE: f32 = 0.125;

const RECURSION_LIMIT: u32 = 20;

// ============================================================================
// Angular limit
// ============================================================================

/// Cosine limit on the tessellated edge angle for a stroke of the given
/// width: the angle whose sagitta at half-stroke radius equals the flatness
/// tolerance. Widths at or below twice the tolerance disable the bound.
pub fn stroke_angular_limit(line_width: f32) -> f32 {
    let ratio = TOLERANCE / (0.5 * line_width).max(TOLERANCE);
    (ratio - 2.0) * ratio * 2.0 + 1.0
}

// ============================================================================
// Flattening
// ============================================================================

/// Flatten every subpath of `path` onto `lines`. An `angular` of `-1`
/// disables the angle bound (filling); larger values additionally emit the
/// control points so the stroker sees the curve's end tangents.
pub fn flatten(path: &BezierPath, angular: f32, lines: &mut LinePath) {
    for (points, closed) in path.iter() {
        if points.is_empty() {
            continue;
        }
        lines.begin(points[0]);
        let mut start = points[0];
        for segment in points[1..].chunks_exact(3) {
            add_bezier(lines, start, segment[0], segment[1], segment[2], angular);
            start = segment[2];
        }
        if closed {
            lines.close();
        }
    }
}

/// Cut one cubic at its axis extrema and curvature extremum, then tessellate
/// each monotone piece.
fn add_bezier(
    lines: &mut LinePath,
    point_1: Point,
    control_1: Point,
    control_2: Point,
    point_2: Point,
    angular: f32,
) {
    let edge_1 = control_1 - point_1;
    let edge_2 = control_2 - control_1;
    let edge_3 = point_2 - control_2;

    // Derivative components as quadratics in t.
    let a = edge_1 - edge_2 * 2.0 + edge_3;
    let b = (edge_2 - edge_1) * 2.0;
    let c = edge_1;

    let mut cuts = [0.0f32; 8];
    let mut count = 0;
    quadratic_roots_in_unit(a.x, b.x, c.x, &mut cuts, &mut count);
    quadratic_roots_in_unit(a.y, b.y, c.y, &mut cuts, &mut count);

    // Curvature extremum of cross(P', P''), a quadratic in t.
    let second_1 = edge_2 - edge_1;
    let second_2 = edge_3 - edge_2;
    let curve_a = cross(second_1, second_2);
    let curve_b = cross(edge_1, second_2 - second_1);
    if curve_a != 0.0 {
        let t = -curve_b / (2.0 * curve_a);
        if t > 0.0 && t < 1.0 && count < cuts.len() {
            cuts[count] = t;
            count += 1;
        }
    }

    cuts[..count].sort_by(|x, y| x.partial_cmp(y).unwrap_or(core::cmp::Ordering::Equal));

    let mut cubic = [point_1, control_1, control_2, point_2];
    let mut consumed = 0.0;
    for &t in &cuts[..count] {
        let local = (t - consumed) / (1.0 - consumed);
        let (head, tail) = split(&cubic, local);
        tessellate(lines, &head, angular, 0);
        cubic = tail;
        consumed = t;
    }
    tessellate(lines, &cubic, angular, 0);
}

/// De Casteljau split at parameter `t`.
fn split(cubic: &[Point; 4], t: f32) -> ([Point; 4], [Point; 4]) {
    let ab = lerp(cubic[0], cubic[1], t);
    let bc = lerp(cubic[1], cubic[2], t);
    let cd = lerp(cubic[2], cubic[3], t);
    let abc = lerp(ab, bc, t);
    let bcd = lerp(bc, cd, t);
    let middle = lerp(abc, bcd, t);
    (
        [cubic[0], ab, abc, middle],
        [middle, bcd, cd, cubic[3]],
    )
}

/// Recursive subdivision of one smooth piece.
fn tessellate(lines: &mut LinePath, cubic: &[Point; 4], angular: f32, depth: u32) {
    let [point_1, control_1, control_2, point_2] = *cubic;

    let flatness = TOLERANCE * TOLERANCE;
    let flat = segment_distance_squared(point_1, point_2, control_1) <= flatness
        && segment_distance_squared(point_1, point_2, control_2) <= flatness;

    let turn_ok = {
        let out = first_direction(&[control_1, control_2, point_2], point_1);
        let into = first_direction(&[control_2, control_1, point_1], point_2);
        match (out, into) {
            (Some(d1), Some(d2)) => dot(d1, -d2) >= angular,
            _ => true,
        }
    };

    if (flat && turn_ok) || depth >= RECURSION_LIMIT {
        if angular > -1.0 {
            // Keep the control points so the stroker sees end tangents.
            lines.push(control_1);
            lines.push(control_2);
        }
        lines.push(point_2);
        return;
    }

    let (head, tail) = split(cubic, 0.5);
    tessellate(lines, &head, angular, depth + 1);
    tessellate(lines, &tail, angular, depth + 1);
}

/// Unit direction from `from` toward the first candidate that differs.
fn first_direction(candidates: &[Point; 3], from: Point) -> Option<Point> {
    for &candidate in candidates {
        if candidate != from {
            return Some(normalized(candidate - from));
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
