//! Stroke expansion.
//!
//! A stroked subpath becomes a closed fillable outline by tracing a
//! half-stroke along one side of the centerline and a second half-stroke
//! back along the other side. Closed subpaths close each half as its own
//! loop (the pair forms a ring under nonzero winding); open subpaths join
//! the two halves with caps. All offset math happens in user space, where
//! the line width is defined, and every emitted point is mapped back
//! through the forward matrix. Round joins and caps emit circular-arc
//! cubics, so the expander's output is a Bezier path that gets flattened
//! again before scan conversion.

use crate::basics::Point;
use crate::math::{cross, dot, length, normalized, perpendicular};
use crate::matrix::{Matrix, MatrixPair};
use crate::path::{BezierPath, LinePath};

/// Tangent length factor for a quarter-circle cubic.
const QUARTER_ARC: f32 = 0.552_284_75;

// ============================================================================
// Enums
// ============================================================================

/// Line cap style at open subpath endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Circle,
}

/// Line join style at interior vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

// ============================================================================
// Stroker
// ============================================================================

/// Expands polylines into stroke outlines. Owns its scratch storage so
/// repeated draw calls reuse the allocation.
#[derive(Debug, Default)]
pub struct Stroker {
    user_points: Vec<Point>,
}

impl Stroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand every subpath of `lines` into closed outlines on `out`.
    #[allow(clippy::too_many_arguments)]
    pub fn expand(
        &mut self,
        lines: &LinePath,
        width: f32,
        cap: LineCap,
        join: LineJoin,
        miter_limit: f32,
        matrix: &MatrixPair,
        out: &mut BezierPath,
    ) {
        let half = width * 0.5;
        let miter_squared = miter_limit * miter_limit * half * half;

        for (points, closed) in lines.iter() {
            self.user_points.clear();
            for &p in points {
                let user = matrix.inverse.apply(p);
                if self.user_points.last() != Some(&user) {
                    self.user_points.push(user);
                }
            }
            if closed && self.user_points.len() > 1 && self.user_points.last() == self.user_points.first() {
                self.user_points.pop();
            }
            if self.user_points.len() < 2 {
                continue;
            }

            let pts = &self.user_points;
            let n = pts.len();
            let mut emit = Emitter {
                out: &mut *out,
                forward: &matrix.forward,
            };

            if closed {
                add_half_stroke(
                    &mut emit,
                    |i| pts[i % n],
                    n,
                    true,
                    half,
                    join,
                    miter_squared,
                    true,
                );
                emit.close();
                add_half_stroke(
                    &mut emit,
                    |i| pts[n - 1 - i % n],
                    n,
                    true,
                    half,
                    join,
                    miter_squared,
                    true,
                );
                emit.close();
            } else {
                let start_dir = normalized(pts[1] - pts[0]);
                let end_dir = normalized(pts[n - 1] - pts[n - 2]);
                emit.move_to(pts[0] - half * perpendicular(start_dir));
                add_cap(&mut emit, pts[0], -start_dir, half, cap);
                add_half_stroke(
                    &mut emit,
                    |i| pts[i],
                    n,
                    false,
                    half,
                    join,
                    miter_squared,
                    false,
                );
                add_cap(&mut emit, pts[n - 1], end_dir, half, cap);
                add_half_stroke(
                    &mut emit,
                    |i| pts[n - 1 - i],
                    n,
                    false,
                    half,
                    join,
                    miter_squared,
                    false,
                );
                emit.close();
            }
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Forwards user-space stroke geometry into the output path in canvas space.
struct Emitter<'a> {
    out: &'a mut BezierPath,
    forward: &'a Matrix,
}

impl Emitter<'_> {
    fn move_to(&mut self, p: Point) {
        self.out.move_to(self.forward.apply(p));
    }

    fn line_to(&mut self, p: Point) {
        self.out.line_to(self.forward.apply(p));
    }

    fn curve_to(&mut self, control_1: Point, control_2: Point, p: Point) {
        self.out.curve_to(
            self.forward.apply(control_1),
            self.forward.apply(control_2),
            self.forward.apply(p),
        );
    }

    fn close(&mut self) {
        self.out.close();
    }
}

/// Trace one side of the centerline in travel order. `at` yields the vertex
/// sequence; for a closed subpath the join at the wrap vertex is emitted
/// too. With `begin` the trace starts its own subpath, otherwise it
/// continues from the current point (cap ends line up with the anchors).
#[allow(clippy::too_many_arguments)]
fn add_half_stroke<F: Fn(usize) -> Point>(
    emit: &mut Emitter<'_>,
    at: F,
    n: usize,
    closed: bool,
    half: f32,
    join: LineJoin,
    miter_squared: f32,
    begin: bool,
) {
    let first_dir = normalized(at(1) - at(0));
    let anchor = at(0) + half * perpendicular(first_dir);
    if begin {
        emit.move_to(anchor);
    } else {
        emit.line_to(anchor);
    }

    let mut in_dir = first_dir;
    let mut in_len = length(at(1) - at(0));
    let joins = if closed { n + 1 } else { n - 1 };
    for k in 1..joins {
        let vertex = at(k % n);
        let next = at((k + 1) % n);
        let out_vec = next - vertex;
        let out_len = length(out_vec);
        let out_dir = out_vec * (1.0 / out_len);
        add_join(
            emit,
            vertex,
            in_dir,
            in_len,
            out_dir,
            out_len,
            half,
            join,
            miter_squared,
        );
        in_dir = out_dir;
        in_len = out_len;
    }

    if !closed {
        emit.line_to(at(n - 1) + half * perpendicular(in_dir));
    }
}

/// Join two segments at `vertex` on the traced side.
#[allow(clippy::too_many_arguments)]
fn add_join(
    emit: &mut Emitter<'_>,
    vertex: Point,
    in_dir: Point,
    in_len: f32,
    out_dir: Point,
    out_len: f32,
    half: f32,
    join: LineJoin,
    miter_squared: f32,
) {
    let mut in_dir = in_dir;
    let mut out_dir = out_dir;
    let turn = cross(in_dir, out_dir);
    if turn == 0.0 {
        // Straight continuation, or a reversal crossing to the other side.
        emit.line_to(vertex + half * perpendicular(in_dir));
        emit.line_to(vertex + half * perpendicular(out_dir));
        return;
    }

    // Where the two offset lines on this side meet. On the inner side of a
    // tight turn that point lies beyond both segments; emit winding repair
    // points through the vertex and join with the directions exchanged so
    // nonzero filling keeps the overlap covered.
    let offset = (out_dir - in_dir) * (half / turn);
    let offset_squared = dot(offset, offset);
    if turn > 0.0 && offset_squared > in_len * in_len && offset_squared > out_len * out_len {
        emit.line_to(vertex + half * perpendicular(in_dir));
        emit.line_to(vertex);
        emit.line_to(vertex + half * perpendicular(out_dir));
        core::mem::swap(&mut in_dir, &mut out_dir);
    }

    if join == LineJoin::Miter && offset_squared <= miter_squared {
        emit.line_to(vertex + offset);
        return;
    }
    let side_in = vertex + half * perpendicular(in_dir);
    let side_out = vertex + half * perpendicular(out_dir);
    if join == LineJoin::Round {
        let angle = dot(in_dir, out_dir).clamp(-1.0, 1.0).acos();
        let k = (4.0 / 3.0) * (angle / 4.0).tan() * half;
        emit.line_to(side_in);
        emit.curve_to(side_in + k * in_dir, side_out - k * out_dir, side_out);
    } else {
        emit.line_to(side_in);
        emit.line_to(side_out);
    }
}

/// Cap an open endpoint. The current point is `p + half*perp(direction)`
/// (the side the trace arrived on); the cap ends on the opposite side with
/// `direction` pointing out of the subpath.
fn add_cap(emit: &mut Emitter<'_>, p: Point, direction: Point, half: f32, cap: LineCap) {
    let side = perpendicular(direction);
    let from = p + half * side;
    let to = p - half * side;
    match cap {
        LineCap::Butt => {
            emit.line_to(to);
        }
        LineCap::Square => {
            emit.line_to(from + half * direction);
            emit.line_to(to + half * direction);
            emit.line_to(to);
        }
        LineCap::Circle => {
            let k = half * QUARTER_ARC;
            let middle = p + half * direction;
            emit.curve_to(from + k * direction, middle + k * side, middle);
            emit.curve_to(middle - k * side, to + k * direction, to);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::flatten;

    fn outline_of(
        lines: &LinePath,
        width: f32,
        cap: LineCap,
        join: LineJoin,
        miter_limit: f32,
    ) -> LinePath {
        let mut stroker = Stroker::new();
        let mut outline = BezierPath::new();
        stroker.expand(
            lines,
            width,
            cap,
            join,
            miter_limit,
            &MatrixPair::identity(),
            &mut outline,
        );
        let mut flat = LinePath::new();
        flatten(&outline, -1.0, &mut flat);
        flat
    }

    fn bounds(lines: &LinePath) -> (Point, Point) {
        let mut lo = Point::new(f32::INFINITY, f32::INFINITY);
        let mut hi = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &lines.points {
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
        }
        (lo, hi)
    }

    fn horizontal(from: f32, to: f32) -> LinePath {
        let mut lines = LinePath::new();
        lines.begin(Point::new(from, 0.0));
        lines.push(Point::new(to, 0.0));
        lines
    }

    #[test]
    fn test_butt_cap_bounds() {
        let flat = outline_of(&horizontal(0.0, 10.0), 2.0, LineCap::Butt, LineJoin::Miter, 10.0);
        let (lo, hi) = bounds(&flat);
        assert!((lo.x - 0.0).abs() < 1e-4 && (hi.x - 10.0).abs() < 1e-4);
        assert!((lo.y + 1.0).abs() < 1e-4 && (hi.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_square_cap_extends_by_half_width() {
        let flat = outline_of(&horizontal(0.0, 10.0), 2.0, LineCap::Square, LineJoin::Miter, 10.0);
        let (lo, hi) = bounds(&flat);
        assert!((lo.x + 1.0).abs() < 1e-4 && (hi.x - 11.0).abs() < 1e-4);
    }

    #[test]
    fn test_circle_cap_stays_within_half_width() {
        let flat = outline_of(&horizontal(0.0, 10.0), 2.0, LineCap::Circle, LineJoin::Miter, 10.0);
        let (lo, hi) = bounds(&flat);
        assert!(lo.x < -0.9 && lo.x > -1.01);
        assert!(hi.x > 10.9 && hi.x < 11.01);
        // Cap points stay on the stroke circle around the endpoints.
        for p in &flat.points {
            if p.x < 0.0 {
                assert!(length(*p) < 1.0 + 0.01);
            }
        }
    }

    #[test]
    fn test_miter_join_reaches_corner() {
        // Right angle at (10, 0) with width 2: the miter tip is at (11, -1)
        // when the turn heads +y.
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(10.0, 0.0));
        lines.push(Point::new(10.0, 10.0));
        let flat = outline_of(&lines, 2.0, LineCap::Butt, LineJoin::Miter, 10.0);
        let tip = flat
            .points
            .iter()
            .any(|p| (p.x - 11.0).abs() < 1e-3 && (p.y + 1.0).abs() < 1e-3);
        assert!(tip, "missing miter tip in {:?}", flat.points);
    }

    #[test]
    fn test_miter_limit_falls_back_to_bevel() {
        // A hairpin angle exceeds a small miter limit.
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(10.0, 0.0));
        lines.push(Point::new(0.0, 1.0));
        let flat = outline_of(&lines, 2.0, LineCap::Butt, LineJoin::Miter, 2.0);
        let (_, hi) = bounds(&flat);
        // The bevel keeps the outline near the corner; a miter would spike
        // far beyond x = 12.
        assert!(hi.x < 13.0);
    }

    #[test]
    fn test_round_join_emits_curves() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(10.0, 0.0));
        lines.push(Point::new(10.0, 10.0));
        let flat = outline_of(&lines, 4.0, LineCap::Butt, LineJoin::Round, 10.0);
        let (_, hi) = bounds(&flat);
        // The round join stays within half-width of the corner.
        assert!(hi.x <= 12.0 + 0.05 && hi.x > 11.5);
    }

    #[test]
    fn test_closed_subpath_emits_two_loops() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(10.0, 0.0));
        lines.push(Point::new(10.0, 10.0));
        lines.push(Point::new(0.0, 10.0));
        lines.close();
        let mut stroker = Stroker::new();
        let mut outline = BezierPath::new();
        stroker.expand(
            &lines,
            2.0,
            LineCap::Butt,
            LineJoin::Miter,
            10.0,
            &MatrixPair::identity(),
            &mut outline,
        );
        let closed = outline.subpaths.iter().filter(|sp| sp.closed).count();
        assert_eq!(closed, 2);
    }

    #[test]
    fn test_zero_length_subpath_emits_nothing() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(5.0, 5.0));
        let flat = outline_of(&lines, 4.0, LineCap::Circle, LineJoin::Round, 10.0);
        assert!(flat.points.is_empty());
    }

    #[test]
    fn test_stroke_math_in_user_space() {
        // Under a 2x scale, a width-2 stroke covers 2 canvas pixels on each
        // side of the scaled centerline.
        let mut pair = MatrixPair::identity();
        pair.concat(Matrix::scaling(2.0, 2.0));
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(20.0, 0.0));
        let mut stroker = Stroker::new();
        let mut outline = BezierPath::new();
        stroker.expand(
            &lines,
            2.0,
            LineCap::Butt,
            LineJoin::Miter,
            10.0,
            &pair,
            &mut outline,
        );
        let mut flat = LinePath::new();
        flatten(&outline, -1.0, &mut flat);
        let (lo, hi) = bounds(&flat);
        assert!((lo.y + 2.0).abs() < 1e-4 && (hi.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_tight_turn_keeps_coverage() {
        // A hairpin with segments shorter than the inner offset excursion.
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(3.0, 0.0));
        lines.push(Point::new(0.0, 0.5));
        let flat = outline_of(&lines, 4.0, LineCap::Butt, LineJoin::Bevel, 10.0);
        // The repair points pass through the vertex itself.
        let through_vertex = flat
            .points
            .iter()
            .any(|p| (p.x - 3.0).abs() < 1e-3 && p.y.abs() < 1e-3);
        assert!(through_vertex);
    }
}
