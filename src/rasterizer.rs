//! Scan conversion of polylines to signed-coverage pixel runs.
//!
//! Every subpath is treated as a closed polygon, clipped to the target
//! rectangle, and walked edge by edge. A non-horizontal edge deposits, in
//! each pixel cell it crosses, the signed trapezoidal area between the edge
//! and the cell's right side, plus a balancing run one cell to the right
//! that carries the remaining crossing height. Sorting by `(y, x, |delta|)`
//! and coalescing equal cells yields the sparse coverage stream the rest of
//! the pipeline consumes: coverage at `(x, y)` is `min(|running sum|, 1)`
//! over the row's runs up to and including column `x`.

use crate::basics::Point;
use crate::math::lerp;
use crate::path::LinePath;

// ============================================================================
// PixelRun
// ============================================================================

/// A signed change in fractional coverage at pixel `(x, y)`, meaningful when
/// runs are traversed in `(y, x)` order with the sum reset per row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRun {
    pub x: u16,
    pub y: u16,
    pub delta: f32,
}

/// Order runs by row, then column, then absolute delta.
#[inline]
pub fn run_order(a: &PixelRun, b: &PixelRun) -> core::cmp::Ordering {
    (a.y, a.x)
        .cmp(&(b.y, b.x))
        .then(a.delta.abs().partial_cmp(&b.delta.abs()).unwrap_or(core::cmp::Ordering::Equal))
}

/// Sum runs sharing a cell and drop the zeros. Requires sorted input.
pub fn coalesce(runs: &mut Vec<PixelRun>) {
    let mut write = 0usize;
    let mut read = 0usize;
    while read < runs.len() {
        let mut merged = runs[read];
        read += 1;
        while read < runs.len() && runs[read].x == merged.x && runs[read].y == merged.y {
            merged.delta += runs[read].delta;
            read += 1;
        }
        if merged.delta != 0.0 {
            runs[write] = merged;
            write += 1;
        }
    }
    runs.truncate(write);
}

// ============================================================================
// Rasterizer
// ============================================================================

/// Converts polyline paths into sorted, coalesced pixel runs. Owns the
/// polygon-clipping scratch so repeated draw calls reuse the allocation.
#[derive(Debug, Default)]
pub struct Rasterizer {
    clipped: Vec<Point>,
    scratch: Vec<Point>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan-convert `lines` (each subpath as a closed polygon), translated
    /// by `offset`, into the rectangle `[0, width] x [0, height]`.
    pub fn convert(
        &mut self,
        lines: &LinePath,
        offset: Point,
        width: u32,
        height: u32,
        runs: &mut Vec<PixelRun>,
    ) {
        runs.clear();
        for (points, _) in lines.iter() {
            if points.len() < 3 {
                continue;
            }
            self.clip_polygon(points, offset, width as f32, height as f32);
            emit_polygon(&self.clipped, runs);
        }
        runs.sort_by(run_order);
        coalesce(runs);
    }

    /// Sutherland-Hodgman clip of the offset polygon against the four
    /// rectangle edges, into `self.clipped`.
    fn clip_polygon(&mut self, points: &[Point], offset: Point, width: f32, height: f32) {
        self.clipped.clear();
        self.clipped.extend(points.iter().map(|&p| p + offset));

        clip_edge(&self.clipped, &mut self.scratch, |p| p.x >= 0.0, |a, b| {
            let mut p = lerp(a, b, (0.0 - a.x) / (b.x - a.x));
            p.x = 0.0;
            p
        });
        core::mem::swap(&mut self.clipped, &mut self.scratch);

        clip_edge(&self.clipped, &mut self.scratch, |p| p.y >= 0.0, |a, b| {
            let mut p = lerp(a, b, (0.0 - a.y) / (b.y - a.y));
            p.y = 0.0;
            p
        });
        core::mem::swap(&mut self.clipped, &mut self.scratch);

        clip_edge(&self.clipped, &mut self.scratch, |p| p.x <= width, move |a, b| {
            let mut p = lerp(a, b, (width - a.x) / (b.x - a.x));
            p.x = width;
            p
        });
        core::mem::swap(&mut self.clipped, &mut self.scratch);

        clip_edge(&self.clipped, &mut self.scratch, |p| p.y <= height, move |a, b| {
            let mut p = lerp(a, b, (height - a.y) / (b.y - a.y));
            p.y = height;
            p
        });
        core::mem::swap(&mut self.clipped, &mut self.scratch);
    }
}

fn clip_edge(
    input: &[Point],
    output: &mut Vec<Point>,
    inside: impl Fn(Point) -> bool,
    crossing: impl Fn(Point, Point) -> Point,
) {
    output.clear();
    let Some(&last) = input.last() else {
        return;
    };
    let mut prev = last;
    for &current in input {
        let current_in = inside(current);
        if current_in != inside(prev) {
            output.push(crossing(prev, current));
        }
        if current_in {
            output.push(current);
        }
        prev = current;
    }
}

// ============================================================================
// Run emission
// ============================================================================

fn emit_polygon(polygon: &[Point], runs: &mut Vec<PixelRun>) {
    if polygon.len() < 3 {
        return;
    }
    let mut prev = polygon[polygon.len() - 1];
    for &current in polygon {
        emit_edge(prev, current, runs);
        prev = current;
    }
}

/// Deposit the runs for one polygon edge. The edge is walked top to bottom,
/// one row strip at a time, with the winding sign taken from the original
/// y direction.
fn emit_edge(a: Point, b: Point, runs: &mut Vec<PixelRun>) {
    if a.y == b.y {
        return;
    }
    let (top, bottom, sign) = if a.y < b.y { (a, b, 1.0) } else { (b, a, -1.0) };
    let dx_dy = (bottom.x - top.x) / (bottom.y - top.y);

    let mut x = top.x;
    let mut y = top.y;
    while y < bottom.y {
        let row = y.floor();
        let next_y = (row + 1.0).min(bottom.y);
        let next_x = top.x + (next_y - top.y) * dx_dy;
        emit_strip(x, y, next_x, next_y, row as u16, sign, runs);
        x = next_x;
        y = next_y;
    }
}

/// Deposit the runs for the part of an edge inside one pixel row.
fn emit_strip(x0: f32, y0: f32, x1: f32, y1: f32, row: u16, sign: f32, runs: &mut Vec<PixelRun>) {
    let rightward = x1 > x0;
    let mut cx = x0;
    let mut cy = y0;
    loop {
        let boundary = if rightward { cx.floor() + 1.0 } else { cx.ceil() - 1.0 };
        let has_more = if rightward { boundary < x1 } else { boundary > x1 };
        if !has_more || x1 == x0 {
            emit_cell(cx, cy, x1, y1, row, sign, runs);
            return;
        }
        let by = y0 + (boundary - x0) * (y1 - y0) / (x1 - x0);
        emit_cell(cx, cy, boundary, by, row, sign, runs);
        cx = boundary;
        cy = by;
    }
}

/// Deposit the trapezoid of one cell crossing plus its carry to the right.
fn emit_cell(x0: f32, y0: f32, x1: f32, y1: f32, row: u16, sign: f32, runs: &mut Vec<PixelRun>) {
    let dy = y1 - y0;
    if dy == 0.0 {
        return;
    }
    let mid_x = 0.5 * (x0 + x1);
    let cell = mid_x.floor().max(0.0) as u16;
    let area = dy * ((cell as f32 + 1.0) - mid_x);
    if area != 0.0 {
        runs.push(PixelRun {
            x: cell,
            y: row,
            delta: sign * area,
        });
    }
    if area != dy {
        runs.push(PixelRun {
            x: cell + 1,
            y: row,
            delta: sign * (dy - area),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_path(x0: f32, y0: f32, x1: f32, y1: f32) -> LinePath {
        let mut lines = LinePath::new();
        lines.begin(Point::new(x0, y0));
        lines.push(Point::new(x1, y0));
        lines.push(Point::new(x1, y1));
        lines.push(Point::new(x0, y1));
        lines.close();
        lines
    }

    /// Coverage of one row, per column, reconstructed from the runs.
    fn row_coverage(runs: &[PixelRun], y: u16, width: usize) -> Vec<f32> {
        let mut coverage = vec![0.0f32; width];
        let mut sum: f32 = 0.0;
        let mut at = 0usize;
        for run in runs.iter().filter(|r| r.y == y) {
            while at < width && at < run.x as usize {
                coverage[at] = sum.abs().min(1.0);
                at += 1;
            }
            sum += run.delta;
        }
        while at < width {
            coverage[at] = sum.abs().min(1.0);
            at += 1;
        }
        coverage
    }

    fn convert(lines: &LinePath, width: u32, height: u32) -> Vec<PixelRun> {
        let mut rasterizer = Rasterizer::new();
        let mut runs = Vec::new();
        rasterizer.convert(lines, Point::ZERO, width, height, &mut runs);
        runs
    }

    #[test]
    fn test_axis_aligned_square() {
        let runs = convert(&rect_path(10.0, 10.0, 20.0, 20.0), 32, 32);
        for y in 0..32u16 {
            let coverage = row_coverage(&runs, y, 32);
            for (x, &c) in coverage.iter().enumerate() {
                let inside = (10..20).contains(&x) && (10..20).contains(&(y as usize));
                let expected = if inside { 1.0 } else { 0.0 };
                assert!(
                    (c - expected).abs() < 1e-5,
                    "({}, {}) coverage {}",
                    x,
                    y,
                    c
                );
            }
        }
    }

    #[test]
    fn test_rows_sum_to_zero() {
        let mut lines = LinePath::new();
        lines.begin(Point::new(3.2, 1.7));
        lines.push(Point::new(27.9, 9.4));
        lines.push(Point::new(14.1, 25.3));
        lines.close();
        let runs = convert(&lines, 32, 32);
        for y in 0..32u16 {
            let sum: f32 = runs.iter().filter(|r| r.y == y).map(|r| r.delta).sum();
            assert!(sum.abs() < 1e-4, "row {} sums to {}", y, sum);
        }
    }

    #[test]
    fn test_fractional_square_has_partial_edges() {
        let runs = convert(&rect_path(10.5, 10.0, 13.5, 11.0), 32, 32);
        let coverage = row_coverage(&runs, 10, 32);
        assert!((coverage[10] - 0.5).abs() < 1e-5);
        assert!((coverage[11] - 1.0).abs() < 1e-5);
        assert!((coverage[12] - 1.0).abs() < 1e-5);
        assert!((coverage[13] - 0.5).abs() < 1e-5);
        assert!(coverage[14].abs() < 1e-5);
    }

    #[test]
    fn test_diagonal_edge_distributes_area() {
        // Right triangle covering the lower-left half of a 4x4 box.
        let mut lines = LinePath::new();
        lines.begin(Point::new(0.0, 0.0));
        lines.push(Point::new(0.0, 4.0));
        lines.push(Point::new(4.0, 4.0));
        lines.close();
        let runs = convert(&lines, 8, 8);
        for y in 0..4u16 {
            let coverage = row_coverage(&runs, y, 8);
            // The diagonal crosses cell (y, y) with half coverage.
            assert!(
                (coverage[y as usize] - 0.5).abs() < 1e-5,
                "row {}: {:?}",
                y,
                coverage
            );
            if y > 0 {
                assert!((coverage[y as usize - 1] - 1.0).abs() < 1e-5);
            }
            let total: f32 = coverage.iter().sum();
            assert!((total - (y as f32 + 0.5)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_offscreen_path_is_clipped_cleanly() {
        // A rectangle extending far beyond the 16x16 target.
        let runs = convert(&rect_path(-50.0, -50.0, 100.0, 8.0), 16, 16);
        for y in 0..8u16 {
            let coverage = row_coverage(&runs, y, 16);
            assert!(coverage.iter().all(|&c| (c - 1.0).abs() < 1e-5));
        }
        for y in 8..16u16 {
            let coverage = row_coverage(&runs, y, 16);
            assert!(coverage.iter().all(|&c| c.abs() < 1e-5));
        }
    }

    #[test]
    fn test_fully_offscreen_path_emits_nothing() {
        let runs = convert(&rect_path(100.0, 100.0, 200.0, 200.0), 16, 16);
        assert!(runs.is_empty());
    }

    #[test]
    fn test_runs_are_sorted_and_coalesced() {
        let mut lines = rect_path(2.0, 2.0, 6.0, 6.0);
        // A second overlapping square doubles some cells.
        lines.begin(Point::new(4.0, 0.0));
        lines.push(Point::new(8.0, 0.0));
        lines.push(Point::new(8.0, 4.0));
        lines.push(Point::new(4.0, 4.0));
        lines.close();
        let runs = convert(&lines, 16, 16);
        for pair in runs.windows(2) {
            assert_ne!(run_order(&pair[0], &pair[1]), core::cmp::Ordering::Greater);
            assert!((pair[0].x, pair[0].y) != (pair[1].x, pair[1].y));
        }
        assert!(runs.iter().all(|r| r.delta != 0.0));
        // Overlap region accumulates winding 2, clamped by the reader.
        let coverage = row_coverage(&runs, 2, 16);
        assert!((coverage[5] - 1.0).abs() < 1e-5);
    }
}
