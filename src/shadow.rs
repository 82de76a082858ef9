//! Shadow generation.
//!
//! A shadowed draw first scan-converts its geometry, offset by the shadow
//! offset, into an alpha-only grid padded on every side by the blur's
//! support. Three passes of a one-dimensional "extended box" filter (the
//! Gwosdek et al. construction: a box of radius `r` with fractional edge
//! taps) per axis approximate a Gaussian of the requested standard
//! deviation. The blurred alpha then drives the ordinary compositing loop,
//! tinted by the shadow color.

use crate::color::Rgba;
use crate::composite::PixelSource;
use crate::rasterizer::PixelRun;

// ============================================================================
// ShadowPass
// ============================================================================

/// Reusable alpha grid and scratch for shadow rendering.
#[derive(Debug, Default)]
pub(crate) struct ShadowPass {
    grid: Vec<f32>,
    width: usize,
    height: usize,
    border: i32,
    radius: i32,
    /// Written region `(x0, x1, y0, y1)`, end-exclusive, in grid coordinates.
    bounds: Option<(usize, usize, usize, usize)>,
    line: Vec<f32>,
    column: Vec<f32>,
}

impl ShadowPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box radius approximating a Gaussian for the given shadow blur.
    pub fn radius_for(blur: f32) -> i32 {
        let sigma_squared = 0.25 * blur * blur;
        (0.5 * (4.0 * sigma_squared + 1.0).sqrt() - 0.5).floor() as i32
    }

    /// Grid padding on each side: the full support of three blur passes.
    pub fn border_for(blur: f32) -> i32 {
        3 * (Self::radius_for(blur) + 1)
    }

    pub fn border(&self) -> i32 {
        self.border
    }

    /// Size and zero the grid for a canvas of the given dimensions.
    pub fn prepare(&mut self, canvas_width: u32, canvas_height: u32, blur: f32) {
        self.radius = Self::radius_for(blur);
        self.border = 3 * (self.radius + 1);
        self.width = canvas_width as usize + 2 * self.border as usize;
        self.height = canvas_height as usize + 2 * self.border as usize;
        let cells = self.width * self.height;
        if self.grid.len() < cells {
            self.grid.resize(cells, 0.0);
        }
        self.grid[..cells].fill(0.0);
        self.bounds = None;
    }

    /// Rasterize a coverage stream into the alpha grid, tracking the
    /// written rectangle.
    pub fn accumulate(&mut self, runs: &[PixelRun]) {
        let mut at = 0usize;
        while at < runs.len() {
            let y = runs[at].y as usize;
            let mut sum = 0.0f32;
            let mut x = runs[at].x as usize;
            let row = y * self.width;
            while at < runs.len() && runs[at].y as usize == y {
                let next = runs[at].x as usize;
                let alpha = sum.abs().min(1.0);
                if alpha > 0.0 && next > x {
                    let x0 = x.min(self.width);
                    let x1 = next.min(self.width);
                    self.grid[row + x0..row + x1].fill(alpha);
                    self.grow_bounds(x0, x1, y);
                }
                sum += runs[at].delta;
                x = next;
                at += 1;
            }
        }
    }

    fn grow_bounds(&mut self, x0: usize, x1: usize, y: usize) {
        let b = self.bounds.get_or_insert((x0, x1, y, y + 1));
        b.0 = b.0.min(x0);
        b.1 = b.1.max(x1);
        b.2 = b.2.min(y);
        b.3 = b.3.max(y + 1);
    }

    /// Three extended-box passes along rows, then three along columns.
    pub fn blur(&mut self, blur: f32) {
        let Some(bounds) = self.bounds else {
            return;
        };
        if blur <= 0.0 {
            return;
        }

        let sigma_squared = 0.25 * blur * blur;
        let r = self.radius;
        let rf = r as f32;
        let alpha = (2.0 * rf + 1.0) * (rf * (rf + 1.0) - sigma_squared)
            / (2.0 * sigma_squared - 6.0 * (rf + 1.0) * (rf + 1.0));
        let divisor = 2.0 * (alpha + rf) + 1.0;
        let weight_1 = alpha / divisor;
        let weight_2 = (1.0 - alpha) / divisor;

        // Inflate by the blur support and clamp to the grid.
        let pad = self.border as usize;
        let x0 = bounds.0.saturating_sub(pad);
        let x1 = (bounds.1 + pad).min(self.width);
        let y0 = bounds.2.saturating_sub(pad);
        let y1 = (bounds.3 + pad).min(self.height);
        self.bounds = Some((x0, x1, y0, y1));

        let r = r as usize;
        for y in y0..y1 {
            let row = y * self.width;
            for _ in 0..3 {
                self.line.clear();
                self.line.extend_from_slice(&self.grid[row + x0..row + x1]);
                blur_line(&self.line, &mut self.grid[row + x0..row + x1], r, weight_1, weight_2);
            }
        }
        for x in x0..x1 {
            for _ in 0..3 {
                self.line.clear();
                self.line
                    .extend((y0..y1).map(|y| self.grid[y * self.width + x]));
                self.column.resize(y1 - y0, 0.0);
                blur_line(&self.line, &mut self.column[..y1 - y0], r, weight_1, weight_2);
                for (i, y) in (y0..y1).enumerate() {
                    self.grid[y * self.width + x] = self.column[i];
                }
            }
        }
    }

    /// Full-coverage runs over the blurred rectangle, in canvas coordinates.
    pub fn span_runs(&self, width: u32, height: u32, out: &mut Vec<PixelRun>) {
        out.clear();
        let Some((gx0, gx1, gy0, gy1)) = self.bounds else {
            return;
        };
        let b = self.border as i64;
        let x0 = (gx0 as i64 - b).clamp(0, width as i64) as u16;
        let x1 = (gx1 as i64 - b).clamp(0, width as i64) as u16;
        let y0 = (gy0 as i64 - b).clamp(0, height as i64);
        let y1 = (gy1 as i64 - b).clamp(0, height as i64);
        if x0 >= x1 {
            return;
        }
        for y in y0..y1 {
            out.push(PixelRun {
                x: x0,
                y: y as u16,
                delta: 1.0,
            });
            out.push(PixelRun {
                x: x1,
                y: y as u16,
                delta: -1.0,
            });
        }
    }

    /// Blurred alpha at a canvas pixel.
    #[inline]
    pub fn alpha_at(&self, x: u16, y: u16) -> f32 {
        let gx = x as usize + self.border as usize;
        let gy = y as usize + self.border as usize;
        self.grid[gy * self.width + gx]
    }
}

/// One extended-box pass: `out[i] = w1*(x[i-r-1] + x[i+r+1]) +
/// (w1+w2) * sum(x[i-r ..= i+r])`, evaluated incrementally.
fn blur_line(src: &[f32], dst: &mut [f32], r: usize, weight_1: f32, weight_2: f32) {
    let n = src.len() as i64;
    let get = |i: i64| -> f32 {
        if i >= 0 && i < n {
            src[i as usize]
        } else {
            0.0
        }
    };
    let r = r as i64;
    let mut rolling = weight_1 * get(r);
    for j in 0..r {
        rolling += (weight_1 + weight_2) * get(j);
    }
    for i in 0..n {
        rolling += weight_1 * (get(i + r + 1) - get(i - r - 2));
        rolling += weight_2 * (get(i + r) - get(i - r - 1));
        dst[i as usize] = rolling;
    }
}

// ============================================================================
// ShadowSource
// ============================================================================

/// Pixel source for the shadow compositing pass: the blurred alpha tinting
/// the (premultiplied, linear) shadow color.
pub(crate) struct ShadowSource<'a> {
    pub pass: &'a ShadowPass,
    pub color: Rgba,
}

impl PixelSource for ShadowSource<'_> {
    #[inline]
    fn pixel(&self, x: u16, y: u16) -> Rgba {
        self.color * self.pass.alpha_at(x, y)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_and_border() {
        assert_eq!(ShadowPass::radius_for(0.0), 0);
        assert_eq!(ShadowPass::border_for(0.0), 3);
        // blur 8: sigma^2 = 16, radius = floor(0.5*sqrt(65) - 0.5) = 3.
        assert_eq!(ShadowPass::radius_for(8.0), 3);
        assert_eq!(ShadowPass::border_for(8.0), 12);
    }

    #[test]
    fn test_blur_line_preserves_mass() {
        let mut src = vec![0.0f32; 64];
        src[32] = 1.0;
        let mut dst = vec![0.0f32; 64];
        // blur 6: sigma^2 = 9, radius 2.
        let sigma_squared = 9.0f32;
        let rf = 2.0f32;
        let alpha = (2.0 * rf + 1.0) * (rf * (rf + 1.0) - sigma_squared)
            / (2.0 * sigma_squared - 6.0 * (rf + 1.0) * (rf + 1.0));
        let divisor = 2.0 * (alpha + rf) + 1.0;
        blur_line(&src, &mut dst, 2, alpha / divisor, (1.0 - alpha) / divisor);
        let total: f32 = dst.iter().sum();
        assert!((total - 1.0).abs() < 1e-3, "mass {}", total);
        // Spread is symmetric around the impulse.
        assert!(dst[32] > dst[31] && dst[31] > dst[29]);
        assert!((dst[31] - dst[33]).abs() < 1e-4);
        assert!((dst[30] - dst[34]).abs() < 1e-4);
    }

    #[test]
    fn test_accumulate_and_blur_spreads_alpha() {
        let mut pass = ShadowPass::new();
        pass.prepare(32, 32, 8.0);
        let border = pass.border() as u16;
        // A 4x4 opaque block in the middle of the canvas.
        let mut runs = Vec::new();
        for y in 0..4u16 {
            runs.push(PixelRun {
                x: border + 14,
                y: border + 14 + y,
                delta: 1.0,
            });
            runs.push(PixelRun {
                x: border + 18,
                y: border + 14 + y,
                delta: -1.0,
            });
        }
        pass.accumulate(&runs);
        assert_eq!(pass.alpha_at(15, 15), 1.0);
        assert_eq!(pass.alpha_at(10, 15), 0.0);
        pass.blur(8.0);
        // A 4x4 block under a sigma-4 blur keeps a modest central value;
        // pixels outside the block pick up a strictly positive tail that
        // decays with distance.
        assert!(pass.alpha_at(16, 16) > 0.08);
        let near = pass.alpha_at(16, 20);
        let far = pass.alpha_at(16, 24);
        assert!(near > 0.0 && near < 1.0);
        assert!(far < near);
    }

    #[test]
    fn test_span_runs_cover_blur_support() {
        let mut pass = ShadowPass::new();
        pass.prepare(64, 64, 4.0);
        let border = pass.border() as u16;
        let mut runs = vec![
            PixelRun {
                x: border + 30,
                y: border + 30,
                delta: 1.0,
            },
            PixelRun {
                x: border + 34,
                y: border + 30,
                delta: -1.0,
            },
        ];
        pass.accumulate(&runs);
        pass.blur(4.0);
        pass.span_runs(64, 64, &mut runs);
        assert!(!runs.is_empty());
        let min_y = runs.iter().map(|r| r.y).min().unwrap();
        let max_y = runs.iter().map(|r| r.y).max().unwrap();
        // One written row, inflated by the support on each side.
        assert!(min_y < 30 && max_y > 30);
        // All rows share the same span columns.
        let x0 = runs[0].x;
        assert!(runs.iter().step_by(2).all(|r| r.x == x0));
    }

    #[test]
    fn test_empty_accumulation_yields_no_spans() {
        let mut pass = ShadowPass::new();
        pass.prepare(16, 16, 2.0);
        pass.blur(2.0);
        let mut runs = vec![PixelRun {
            x: 0,
            y: 0,
            delta: 1.0,
        }];
        pass.span_runs(16, 16, &mut runs);
        assert!(runs.is_empty());
    }
}
