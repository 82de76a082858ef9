//! Brushes and per-pixel color sampling.
//!
//! A [`Brush`] is one of four sources; the [`Painter`] samples it at an
//! inverse-transformed (user-space) position and always returns a
//! premultiplied, linearized color. Gradient stop colors are stored in that
//! working form too, but interpolation happens on the unpremultiplied
//! values and re-premultiplies the result. Pattern sampling is a bicubic
//! (Keys, Catmull-Rom family) convolution whose kernel is scaled by the
//! inverse transform's pixel footprint, clamped to four source pixels.

use crate::basics::Point;
use crate::color::Rgba;
use crate::math::dot;
use crate::matrix::Matrix;

// ============================================================================
// Repetition
// ============================================================================

/// Pattern tiling behavior outside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repetition {
    #[default]
    Repeat,
    RepeatX,
    RepeatY,
    NoRepeat,
}

impl Repetition {
    #[inline]
    fn wraps_x(self) -> bool {
        matches!(self, Repetition::Repeat | Repetition::RepeatX)
    }

    #[inline]
    fn wraps_y(self) -> bool {
        matches!(self, Repetition::Repeat | Repetition::RepeatY)
    }
}

// ============================================================================
// Gradient stops
// ============================================================================

/// Color stops at strictly increasing offsets in `[0, 1]`.
#[derive(Debug, Clone, Default)]
pub struct GradientStops {
    offsets: Vec<f32>,
    colors: Vec<Rgba>,
}

impl GradientStops {
    /// Insert a stop, keeping offsets strictly sorted. A stop at an existing
    /// offset replaces the old color.
    pub fn add(&mut self, offset: f32, color: Rgba) {
        match self
            .offsets
            .binary_search_by(|o| o.partial_cmp(&offset).unwrap_or(core::cmp::Ordering::Less))
        {
            Ok(at) => self.colors[at] = color,
            Err(at) => {
                self.offsets.insert(at, offset);
                self.colors.insert(at, color);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Sample at `t`, clamping outside the stop range. Interpolation runs on
    /// unpremultiplied channels and re-premultiplies.
    fn sample(&self, t: f32) -> Rgba {
        let Some((&first, rest)) = self.offsets.split_first() else {
            return Rgba::TRANSPARENT;
        };
        if t <= first || rest.is_empty() {
            return self.colors[0];
        }
        if t >= *self.offsets.last().unwrap() {
            return *self.colors.last().unwrap();
        }
        let hi = self.offsets.partition_point(|&o| o < t);
        let lo = hi - 1;
        let span = self.offsets[hi] - self.offsets[lo];
        let fraction = (t - self.offsets[lo]) / span;
        self.colors[lo]
            .unpremultiplied()
            .lerp(self.colors[hi].unpremultiplied(), fraction)
            .premultiplied()
    }
}

// ============================================================================
// Brush
// ============================================================================

/// What a fill or stroke paints with. Colors (including gradient stops and
/// pattern pixels) are premultiplied and linearized on entry.
#[derive(Debug, Clone)]
pub enum Brush {
    Color(Rgba),
    Linear {
        start: Point,
        end: Point,
        stops: GradientStops,
    },
    Radial {
        start: Point,
        end: Point,
        start_radius: f32,
        end_radius: f32,
        stops: GradientStops,
    },
    Pattern {
        pixels: Vec<Rgba>,
        width: usize,
        height: usize,
        repetition: Repetition,
    },
}

impl Brush {
    /// The gradient stop list, when this brush is a gradient.
    pub fn stops_mut(&mut self) -> Option<&mut GradientStops> {
        match self {
            Brush::Linear { stops, .. } | Brush::Radial { stops, .. } => Some(stops),
            _ => None,
        }
    }
}

// ============================================================================
// Painter
// ============================================================================

/// Samples a brush at user-space positions. Built once per draw call so the
/// pattern footprint is derived from the current transform only once.
pub struct Painter<'a> {
    brush: &'a Brush,
    footprint_x: f32,
    footprint_y: f32,
}

impl<'a> Painter<'a> {
    pub fn new(brush: &'a Brush, inverse: &Matrix) -> Self {
        Self {
            brush,
            footprint_x: (inverse.a.abs() + inverse.c.abs()).clamp(1.0, 4.0),
            footprint_y: (inverse.b.abs() + inverse.d.abs()).clamp(1.0, 4.0),
        }
    }

    /// Premultiplied, linearized color of the brush at user-space point `p`.
    pub fn pixel(&self, p: Point) -> Rgba {
        match self.brush {
            Brush::Color(color) => *color,
            Brush::Linear { start, end, stops } => {
                let axis = *end - *start;
                let denominator = dot(axis, axis);
                if denominator == 0.0 {
                    return Rgba::TRANSPARENT;
                }
                stops.sample(dot(p - *start, axis) / denominator)
            }
            Brush::Radial {
                start,
                end,
                start_radius,
                end_radius,
                stops,
            } => match radial_parameter(p, *start, *end, *start_radius, *end_radius) {
                Some(t) => stops.sample(t),
                None => Rgba::TRANSPARENT,
            },
            Brush::Pattern {
                pixels,
                width,
                height,
                repetition,
            } => self.sample_pattern(p, pixels, *width, *height, *repetition),
        }
    }

    /// Bicubic convolution over a footprint-scaled 4x4 tap neighborhood.
    /// Taps outside the image in non-repeating directions contribute
    /// transparent black, which fades the pattern out at its edges.
    fn sample_pattern(
        &self,
        p: Point,
        pixels: &[Rgba],
        width: usize,
        height: usize,
        repetition: Repetition,
    ) -> Rgba {
        // Tap positions are pixel centers, so shift into index space.
        let u = p.x - 0.5;
        let v = p.y - 0.5;
        let fx = self.footprint_x;
        let fy = self.footprint_y;

        let i0 = (u - 2.0 * fx).ceil() as i64;
        let i1 = (u + 2.0 * fx).floor() as i64;
        let j0 = (v - 2.0 * fy).ceil() as i64;
        let j1 = (v + 2.0 * fy).floor() as i64;

        let mut sum = Rgba::TRANSPARENT;
        let mut total = 0.0f32;
        for j in j0..=j1 {
            let weight_y = keys_cubic((v - j as f32) / fy) / fy;
            if weight_y == 0.0 {
                continue;
            }
            let row = wrap_index(j, height, repetition.wraps_y());
            for i in i0..=i1 {
                let weight = keys_cubic((u - i as f32) / fx) / fx * weight_y;
                if weight == 0.0 {
                    continue;
                }
                total += weight;
                let Some(row) = row else { continue };
                if let Some(column) = wrap_index(i, width, repetition.wraps_x()) {
                    sum = sum + pixels[row * width + column] * weight;
                }
            }
        }
        if total > 0.0 {
            sum * (1.0 / total)
        } else {
            Rgba::TRANSPARENT
        }
    }
}

/// Wrap or reject a tap index along one axis.
#[inline]
fn wrap_index(i: i64, extent: usize, wraps: bool) -> Option<usize> {
    if wraps {
        Some(i.rem_euclid(extent as i64) as usize)
    } else if i >= 0 && (i as usize) < extent {
        Some(i as usize)
    } else {
        None
    }
}

/// Keys cubic kernel with a = -1/2 (the Catmull-Rom member, C1 continuous).
#[inline]
fn keys_cubic(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        ((1.5 * t - 2.5) * t) * t + 1.0
    } else if t < 2.0 {
        (((-0.5 * t) + 2.5) * t - 4.0) * t + 2.0
    } else {
        0.0
    }
}

/// Solve for the two-circle interpolation parameter at `p`: the largest `t`
/// with `|p - lerp(start, end, t)| = lerp(r0, r1, t)` and a non-negative
/// radius. `None` means the point is outside the gradient's cone.
fn radial_parameter(p: Point, start: Point, end: Point, r0: f32, r1: f32) -> Option<f32> {
    let axis = end - start;
    let dr = r1 - r0;
    let q = p - start;
    let a = dot(axis, axis) - dr * dr;
    let b = -2.0 * (dot(q, axis) + r0 * dr);
    let c = dot(q, q) - r0 * r0;

    let radius_ok = |t: f32| r0 + t * dr >= 0.0;
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let t = -c / b;
        return radius_ok(t).then_some(t);
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let t1 = (-b + root) / (2.0 * a);
    let t2 = (-b - root) / (2.0 * a);
    let (hi, lo) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };
    if radius_ok(hi) {
        Some(hi)
    } else if radius_ok(lo) {
        Some(lo)
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
