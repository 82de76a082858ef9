//! Dash pattern walking.
//!
//! Dashing runs on the flattened polyline, before stroke expansion. Segment
//! lengths are measured on inverse-transformed points so the pattern is in
//! user units, while the emitted boundary points stay in canvas space (an
//! affine map commutes with the interpolation). Each "on" interval becomes a
//! new open subpath; a closed subpath whose walk begins and ends inside the
//! same style of interval gets its last dash spliced onto its first so the
//! wrap joint is continuous.

use crate::math::{length, lerp};
use crate::matrix::Matrix;
use crate::path::LinePath;

/// Walk `pattern` (alternating on/off lengths, starting "on") over every
/// subpath of `lines`, emitting the "on" pieces into `out`.
///
/// An odd-length pattern repeats with alternating parity, which is exactly
/// the behavior of the pattern concatenated with itself. The caller ensures
/// the pattern sum is positive.
pub fn dash_lines(
    lines: &LinePath,
    pattern: &[f32],
    offset: f32,
    inverse: &Matrix,
    out: &mut LinePath,
) {
    let cycle: f32 = pattern.iter().sum::<f32>() * if pattern.len() % 2 == 1 { 2.0 } else { 1.0 };
    if pattern.is_empty() || cycle <= 0.0 {
        return;
    }

    // Starting interval for the (wrapped) dash offset.
    let mut phase = offset.rem_euclid(cycle);
    let mut start_index = 0usize;
    while phase >= pattern[start_index % pattern.len()] {
        phase -= pattern[start_index % pattern.len()];
        start_index += 1;
    }
    let start_remaining = pattern[start_index % pattern.len()] - phase;

    for (points, closed) in lines.iter() {
        if points.len() < 2 {
            continue;
        }

        let mut index = start_index;
        let mut remaining = start_remaining;
        let mut on = index % 2 == 0;
        let started_on = on;
        let first_subpath = out.subpaths.len();
        let first_point = out.points.len();
        let mut toggles = 0usize;

        if on {
            out.begin(points[0]);
        }

        let segment_count = if closed { points.len() } else { points.len() - 1 };
        for seg in 0..segment_count {
            let a = points[seg];
            let b = points[(seg + 1) % points.len()];
            let user_length = length(inverse.apply(b) - inverse.apply(a));
            if user_length == 0.0 {
                continue;
            }
            let mut travelled = 0.0;
            while travelled + remaining < user_length {
                travelled += remaining;
                let boundary = lerp(a, b, travelled / user_length);
                if on {
                    out.push(boundary);
                } else {
                    out.begin(boundary);
                }
                on = !on;
                toggles += 1;
                index += 1;
                remaining = pattern[index % pattern.len()];
            }
            remaining -= user_length - travelled;
            if on {
                out.push(b);
            }
        }

        if closed && started_on && on {
            if toggles == 0 {
                // The whole loop is one dash.
                out.close();
            } else if out.subpaths.len() > first_subpath + 1 {
                splice_last_to_first(out, first_subpath, first_point);
            }
        }
    }
}

/// Move the final emitted subpath in front of the first one for this input
/// subpath, dropping the duplicated junction point.
fn splice_last_to_first(out: &mut LinePath, first_subpath: usize, first_point: usize) {
    let Some(last) = out.subpaths.pop() else {
        return;
    };
    out.points[first_point..].rotate_right(last.count);
    if out.points[first_point + last.count - 1] == out.points[first_point + last.count] {
        out.points.remove(first_point + last.count - 1);
        out.subpaths[first_subpath].count += last.count - 1;
    } else {
        out.subpaths[first_subpath].count += last.count;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::Point;

    fn horizontal_line(length: f32) -> LinePath {
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 50.0));
        lines.push(Point::new(length, 50.0));
        lines
    }

    fn dash_simple(lines: &LinePath, pattern: &[f32], offset: f32) -> LinePath {
        let mut out = LinePath::new();
        dash_lines(lines, pattern, offset, &Matrix::IDENTITY, &mut out);
        out
    }

    #[test]
    fn test_even_split_of_straight_line() {
        let out = dash_simple(&horizontal_line(100.0), &[10.0, 10.0], 0.0);
        assert_eq!(out.subpaths.len(), 5);
        for (points, closed) in out.iter() {
            assert!(!closed);
            assert_eq!(points.len(), 2);
            assert!((points[1].x - points[0].x - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_offset_by_full_cycle_is_identity() {
        let base = dash_simple(&horizontal_line(100.0), &[10.0, 10.0], 0.0);
        let cycled = dash_simple(&horizontal_line(100.0), &[10.0, 10.0], 20.0);
        let negative = dash_simple(&horizontal_line(100.0), &[10.0, 10.0], -40.0);
        assert_eq!(base.points, cycled.points);
        assert_eq!(base.points, negative.points);
    }

    #[test]
    fn test_offset_suppresses_first_dash() {
        let out = dash_simple(&horizontal_line(100.0), &[10.0, 10.0], 10.0);
        // The walk starts inside the gap, so nothing is emitted before x=10.
        assert!(out.points.iter().all(|p| p.x >= 10.0 - 1e-4));
        assert!((out.points[0].x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_odd_pattern_alternates_parity() {
        // [5] behaves as [5, 5].
        let odd = dash_simple(&horizontal_line(30.0), &[5.0], 0.0);
        let doubled = dash_simple(&horizontal_line(30.0), &[5.0, 5.0], 0.0);
        assert_eq!(odd.points, doubled.points);
        assert_eq!(odd.subpaths.len(), doubled.subpaths.len());
    }

    #[test]
    fn test_dash_lengths_measured_in_user_units() {
        // A canvas-space line of 200 is 100 user units under a 2x scale.
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(200.0, 0.0));
        let inverse = Matrix::scaling(0.5, 0.5);
        let mut out = LinePath::new();
        dash_lines(&lines, &[10.0, 10.0], 0.0, &inverse, &mut out);
        assert_eq!(out.subpaths.len(), 5);
        // Each dash spans 20 canvas units.
        let (first, _) = out.iter().next().unwrap();
        assert!((first[1].x - first[0].x - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_closed_loop_splices_wrap_dash() {
        // A 40-unit square perimeter, pattern [10, 10], offset chosen so the
        // walk starts and ends mid-dash.
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(10.0, 0.0));
        lines.push(Point::new(10.0, 10.0));
        lines.push(Point::new(0.0, 10.0));
        lines.close();
        let out = dash_simple(&lines, &[10.0, 10.0], 5.0);
        // on: 0..5 and 35..40 (spliced together), plus 15..25.
        assert_eq!(out.subpaths.len(), 2);
        let (spliced, closed) = out.iter().next().unwrap();
        assert!(!closed);
        // The spliced dash runs from perimeter position 35 through 40/0 to 5.
        assert_eq!(spliced.first().copied(), Some(Point::new(0.0, 5.0)));
        assert_eq!(spliced.last().copied(), Some(Point::new(5.0, 0.0)));
    }

    #[test]
    fn test_fully_covered_closed_loop_stays_closed() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(10.0, 0.0));
        lines.push(Point::new(10.0, 10.0));
        lines.close();
        let out = dash_simple(&lines, &[1000.0, 1000.0], 0.0);
        assert_eq!(out.subpaths.len(), 1);
        assert!(out.subpaths[0].closed);
    }
}
