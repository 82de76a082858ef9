//! Path storage.
//!
//! Two flat point-plus-metadata containers back the whole pipeline:
//!
//! - [`BezierPath`]: each subpath holds `1 + 3k` points, a start point
//!   followed by `k` cubic segments `(control 1, control 2, end)`. Straight
//!   lines are stored as degenerate cubics so every segment is uniform.
//! - [`LinePath`]: each subpath is a plain polyline.
//!
//! A subpath with exactly one point is a pending `move_to`; replacing it is
//! silent. All points are in canvas space: callers transform on entry.

use crate::basics::Point;

// ============================================================================
// Subpath
// ============================================================================

/// Per-subpath metadata: how many points it owns and whether it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subpath {
    pub count: usize,
    pub closed: bool,
}

/// Iterate `(points, closed)` pairs over flat subpath storage.
pub fn subpath_slices<'a>(
    points: &'a [Point],
    subpaths: &'a [Subpath],
) -> impl Iterator<Item = (&'a [Point], bool)> + 'a {
    let mut at = 0usize;
    subpaths.iter().map(move |sp| {
        let slice = &points[at..at + sp.count];
        at += sp.count;
        (slice, sp.closed)
    })
}

// ============================================================================
// BezierPath
// ============================================================================

/// A path of cubic Bezier subpaths.
#[derive(Debug, Clone, Default)]
pub struct BezierPath {
    pub points: Vec<Point>,
    pub subpaths: Vec<Subpath>,
}

impl BezierPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.subpaths.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[Point], bool)> + '_ {
        subpath_slices(&self.points, &self.subpaths)
    }

    /// Begin a new subpath at `p`. A pending one-point subpath is replaced.
    pub fn move_to(&mut self, p: Point) {
        if let Some(last) = self.subpaths.last() {
            if last.count == 1 {
                *self.points.last_mut().unwrap() = p;
                return;
            }
        }
        self.subpaths.push(Subpath {
            count: 1,
            closed: false,
        });
        self.points.push(p);
    }

    /// Append a straight segment, stored as a degenerate cubic. A zero-length
    /// segment is skipped; on an empty path this is a `move_to`.
    pub fn line_to(&mut self, p: Point) {
        let Some(last) = self.last_point() else {
            self.move_to(p);
            return;
        };
        if p == last {
            return;
        }
        self.points.push(last);
        self.points.push(p);
        self.points.push(p);
        self.subpaths.last_mut().unwrap().count += 3;
    }

    /// Append a cubic segment. On an empty path the subpath starts at the
    /// first control point.
    pub fn curve_to(&mut self, control_1: Point, control_2: Point, p: Point) {
        if self.subpaths.is_empty() {
            self.move_to(control_1);
        }
        self.points.push(control_1);
        self.points.push(control_2);
        self.points.push(p);
        self.subpaths.last_mut().unwrap().count += 3;
    }

    /// Close the current subpath and begin a new pending subpath at its
    /// start point. A pending or absent subpath is left alone.
    pub fn close(&mut self) {
        let Some(last) = self.subpaths.last_mut() else {
            return;
        };
        if last.count < 4 {
            return;
        }
        last.closed = true;
        let first = self.points[self.points.len() - last.count];
        self.subpaths.push(Subpath {
            count: 1,
            closed: false,
        });
        self.points.push(first);
    }
}

// ============================================================================
// LinePath
// ============================================================================

/// A path of polyline subpaths.
#[derive(Debug, Clone, Default)]
pub struct LinePath {
    pub points: Vec<Point>,
    pub subpaths: Vec<Subpath>,
}

impl LinePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.subpaths.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[Point], bool)> + '_ {
        subpath_slices(&self.points, &self.subpaths)
    }

    /// Begin a new subpath at `p`.
    pub fn begin(&mut self, p: Point) {
        self.subpaths.push(Subpath {
            count: 1,
            closed: false,
        });
        self.points.push(p);
    }

    /// Append a point to the current subpath, skipping exact duplicates.
    pub fn push(&mut self, p: Point) {
        debug_assert!(!self.subpaths.is_empty());
        if *self.points.last().unwrap() == p {
            return;
        }
        self.points.push(p);
        self.subpaths.last_mut().unwrap().count += 1;
    }

    /// Mark the current subpath closed.
    pub fn close(&mut self) {
        if let Some(last) = self.subpaths.last_mut() {
            last.closed = true;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_to_replaces_pending() {
        let mut path = BezierPath::new();
        path.move_to(Point::new(1.0, 1.0));
        path.move_to(Point::new(2.0, 2.0));
        assert_eq!(path.subpaths.len(), 1);
        assert_eq!(path.points, vec![Point::new(2.0, 2.0)]);
    }

    #[test]
    fn test_line_to_stores_degenerate_cubic() {
        let mut path = BezierPath::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(10.0, 0.0));
        assert_eq!(path.subpaths[0].count, 4);
        assert_eq!(path.points[1], Point::new(0.0, 0.0));
        assert_eq!(path.points[2], Point::new(10.0, 0.0));
        assert_eq!(path.points[3], Point::new(10.0, 0.0));
    }

    #[test]
    fn test_line_to_skips_zero_length() {
        let mut path = BezierPath::new();
        path.move_to(Point::new(5.0, 5.0));
        path.line_to(Point::new(5.0, 5.0));
        assert_eq!(path.subpaths[0].count, 1);
    }

    #[test]
    fn test_line_to_on_empty_is_move_to() {
        let mut path = BezierPath::new();
        path.line_to(Point::new(3.0, 4.0));
        assert_eq!(path.subpaths.len(), 1);
        assert_eq!(path.subpaths[0].count, 1);
    }

    #[test]
    fn test_close_starts_pending_subpath_at_start() {
        let mut path = BezierPath::new();
        path.move_to(Point::new(1.0, 2.0));
        path.line_to(Point::new(3.0, 2.0));
        path.close();
        assert_eq!(path.subpaths.len(), 2);
        assert!(path.subpaths[0].closed);
        assert_eq!(path.subpaths[1].count, 1);
        assert_eq!(path.last_point(), Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_close_ignores_pending_subpath() {
        let mut path = BezierPath::new();
        path.move_to(Point::new(1.0, 2.0));
        path.close();
        assert_eq!(path.subpaths.len(), 1);
        assert!(!path.subpaths[0].closed);
    }

    #[test]
    fn test_subpath_iteration() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(1.0, 0.0));
        lines.close();
        lines.begin(Point::new(5.0, 5.0));
        lines.push(Point::new(6.0, 5.0));
        lines.push(Point::new(6.0, 6.0));

        let collected: Vec<_> = lines.iter().map(|(pts, closed)| (pts.len(), closed)).collect();
        assert_eq!(collected, vec![(2, true), (3, false)]);
    }

    #[test]
    fn test_line_path_push_dedups() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(0.0, 0.0));
        lines.push(Point::new(1.0, 0.0));
        lines.push(Point::new(1.0, 0.0));
        assert_eq!(lines.subpaths[0].count, 2);
    }
}
