//! Composite operations and the blending pass.
//!
//! The eleven canvas composite operations all reduce to
//! `blend = fore * mix_fore + back * mix_back` with each factor drawn from
//! `{0, 1, alpha, 1 - alpha}` of the *other* operand. The operation packs
//! both selections into four bits, two per factor.
//!
//! [`blend_runs`] is the single compositing loop: it merges the path's
//! coverage stream with the clip mask's visibility stream in `(y, x)` order
//! and paints every span where the merged state demands it, converting
//! scanline fragments to premultiplied linear on read and back on write.
//! Operations whose `mix_back` collapses without source coverage (the
//! `*-in`, `*-copy`, `*-out`, `destination-atop` family) must also paint
//! spans the path never touched, which is why the clip stream drives the
//! merge everywhere the mask is live.

use crate::basics::Point;
use crate::color::{Rgba, ALPHA_EPSILON};
use crate::gamma::Gamma;
use crate::matrix::Matrix;
use crate::paint::Painter;
use crate::rasterizer::PixelRun;
use crate::surface::Surface;

// ============================================================================
// CompositeOp
// ============================================================================

const MIX_ZERO: u8 = 0;
const MIX_ONE: u8 = 1;
const MIX_ALPHA: u8 = 2;
const MIX_ONE_MINUS_ALPHA: u8 = 3;

/// Canvas global composite operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    SourceAtop,
    SourceCopy,
    SourceIn,
    SourceOut,
    #[default]
    SourceOver,
    DestinationAtop,
    DestinationIn,
    DestinationOut,
    DestinationOver,
    /// Additive blending; the canvas "lighter" / "plus" operation.
    Lighter,
    Xor,
}

impl CompositeOp {
    /// Four-bit factor encoding: the low two bits select `mix_fore` over
    /// `back.a`, the next two select `mix_back` over `fore.a`.
    #[inline]
    pub fn packed(self) -> u8 {
        let (fore, back) = match self {
            CompositeOp::SourceIn => (MIX_ALPHA, MIX_ZERO),
            CompositeOp::SourceCopy => (MIX_ONE, MIX_ZERO),
            CompositeOp::SourceOut => (MIX_ONE_MINUS_ALPHA, MIX_ZERO),
            CompositeOp::DestinationIn => (MIX_ZERO, MIX_ALPHA),
            CompositeOp::DestinationAtop => (MIX_ONE_MINUS_ALPHA, MIX_ALPHA),
            CompositeOp::Lighter => (MIX_ONE, MIX_ONE),
            CompositeOp::DestinationOver => (MIX_ONE_MINUS_ALPHA, MIX_ONE),
            CompositeOp::DestinationOut => (MIX_ZERO, MIX_ONE_MINUS_ALPHA),
            CompositeOp::SourceAtop => (MIX_ALPHA, MIX_ONE_MINUS_ALPHA),
            CompositeOp::SourceOver => (MIX_ONE, MIX_ONE_MINUS_ALPHA),
            CompositeOp::Xor => (MIX_ONE_MINUS_ALPHA, MIX_ONE_MINUS_ALPHA),
        };
        fore | (back << 2)
    }

    /// Whether the operation rewrites pixels the path itself never covered
    /// (its `mix_back` drops the destination without source coverage).
    #[inline]
    pub fn clears_unpainted(self) -> bool {
        matches!(self.packed() >> 2, MIX_ZERO | MIX_ALPHA)
    }
}

#[inline]
fn mix_factor(selector: u8, alpha: f32) -> f32 {
    match selector {
        MIX_ZERO => 0.0,
        MIX_ONE => 1.0,
        MIX_ALPHA => alpha,
        _ => 1.0 - alpha,
    }
}

// ============================================================================
// Pixel sources
// ============================================================================

/// Per-pixel source color for a compositing pass, premultiplied and linear,
/// before coverage and global alpha are applied.
pub(crate) trait PixelSource {
    fn pixel(&self, x: u16, y: u16) -> Rgba;
}

/// The main pass source: the active brush sampled at the pixel center,
/// inverse-transformed into user space.
pub(crate) struct BrushSource<'a> {
    pub painter: Painter<'a>,
    pub inverse: Matrix,
}

impl PixelSource for BrushSource<'_> {
    #[inline]
    fn pixel(&self, x: u16, y: u16) -> Rgba {
        let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
        self.painter.pixel(self.inverse.apply(center))
    }
}

// ============================================================================
// Blend loop
// ============================================================================

/// Per-pass parameters for [`blend_runs`].
pub(crate) struct BlendParams {
    pub global_alpha: f32,
    pub op: CompositeOp,
    pub width: u32,
    pub height: u32,
}

/// Merge the path and clip streams and paint every span that needs it.
pub(crate) fn blend_runs<S: Surface, P: PixelSource>(
    surface: &mut S,
    gamma: Gamma,
    path_runs: &[PixelRun],
    mask_runs: &[PixelRun],
    source: &P,
    params: &BlendParams,
    span: &mut Vec<Rgba>,
) {
    let mut path_at = 0usize;
    let mut mask_at = 0usize;
    let mut row: Option<u16> = None;
    let mut x = 0u16;
    let mut path_sum = 0.0f32;
    let mut clip_sum = 0.0f32;

    while path_at < path_runs.len() || mask_at < mask_runs.len() {
        let path_key = path_runs.get(path_at).map(|r| (r.y, r.x));
        let mask_key = mask_runs.get(mask_at).map(|r| (r.y, r.x));
        let key = match (path_key, mask_key) {
            (Some(p), Some(m)) => p.min(m),
            (Some(p), None) => p,
            (None, Some(m)) => m,
            (None, None) => unreachable!(),
        };

        if row != Some(key.0) {
            row = Some(key.0);
            path_sum = 0.0;
            clip_sum = 0.0;
        } else if key.1 > x {
            paint_span(
                surface, gamma, source, params, span, key.0, x, key.1, path_sum, clip_sum,
            );
        }
        x = key.1;

        if path_key == Some(key) {
            path_sum += path_runs[path_at].delta;
            path_at += 1;
        }
        if mask_key == Some(key) {
            clip_sum += mask_runs[mask_at].delta;
            mask_at += 1;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_span<S: Surface, P: PixelSource>(
    surface: &mut S,
    gamma: Gamma,
    source: &P,
    params: &BlendParams,
    span: &mut Vec<Rgba>,
    y: u16,
    x_start: u16,
    x_end: u16,
    path_sum: f32,
    clip_sum: f32,
) {
    let coverage = path_sum.abs().min(1.0);
    let visibility = clip_sum.abs().min(1.0);
    if visibility < ALPHA_EPSILON {
        return;
    }
    if coverage < ALPHA_EPSILON && !params.op.clears_unpainted() {
        return;
    }
    if y as u32 >= params.height {
        return;
    }
    let x0 = (x_start as u32).min(params.width);
    let x1 = (x_end as u32).min(params.width);
    if x0 >= x1 {
        return;
    }

    let packed = params.op.packed();
    let strength = coverage * params.global_alpha;

    span.resize((x1 - x0) as usize, Rgba::TRANSPARENT);
    surface.read_span(x0, y as u32, span);
    for (i, pixel) in span.iter_mut().enumerate() {
        let back = pixel.linearized(gamma).premultiplied();
        let fore = source.pixel(x0 as u16 + i as u16, y) * strength;
        let mut blend = fore * mix_factor(packed & 3, back.a) + back * mix_factor(packed >> 2, fore.a);
        blend.a = blend.a.min(1.0);
        let out = blend * visibility + back * (1.0 - visibility);
        *pixel = out.unpremultiplied().delinearized(gamma);
    }
    surface.write_span(x0, y as u32, span);
}

// ============================================================================
// Tests
// ============================================================================
