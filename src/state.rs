//! The reversible drawing state and its save stack bounds.
//!
//! Everything `save()` must capture lives in one [`DrawState`] value:
//! transform pair, compositing controls, shadow parameters, line style,
//! dash configuration, both brushes, and the clip mask. `restore()` swaps
//! the whole value back. The stack itself lives in the canvas; this module
//! fixes its capacity.

use crate::basics::Point;
use crate::color::{Rgba, ALPHA_EPSILON};
use crate::composite::CompositeOp;
use crate::matrix::MatrixPair;
use crate::paint::Brush;
use crate::rasterizer::PixelRun;
use crate::stroke::{LineCap, LineJoin};

/// Maximum number of states `save()` can hold at once.
pub const SAVE_STACK_DEPTH: usize = 16;

// ============================================================================
// DrawState
// ============================================================================

/// All drawing state a `save()`/`restore()` pair round-trips.
#[derive(Debug, Clone)]
pub struct DrawState {
    pub matrix: MatrixPair,
    pub global_alpha: f32,
    pub op: CompositeOp,
    /// Premultiplied, linearized.
    pub shadow_color: Rgba,
    pub shadow_offset: Point,
    pub shadow_blur: f32,
    pub line_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub dash_pattern: Vec<f32>,
    pub dash_offset: f32,
    pub fill_brush: Brush,
    pub stroke_brush: Brush,
    pub clip_mask: Vec<PixelRun>,
}

impl DrawState {
    /// The canvas-default state with a clip mask showing everything.
    pub fn new(width: u16, height: u16) -> Self {
        let mut clip_mask = Vec::new();
        crate::clip::full_mask(width, height, &mut clip_mask);
        Self {
            matrix: MatrixPair::identity(),
            global_alpha: 1.0,
            op: CompositeOp::SourceOver,
            shadow_color: Rgba::TRANSPARENT,
            shadow_offset: Point::ZERO,
            shadow_blur: 0.0,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash_pattern: Vec::new(),
            dash_offset: 0.0,
            fill_brush: Brush::Color(Rgba::new(0.0, 0.0, 0.0, 1.0)),
            stroke_brush: Brush::Color(Rgba::new(0.0, 0.0, 0.0, 1.0)),
            clip_mask,
        }
    }

    /// Whether draw calls get a shadow pass: a visible shadow color plus
    /// either blur or an offset.
    pub fn shadow_enabled(&self) -> bool {
        self.shadow_color.a >= ALPHA_EPSILON
            && (self.shadow_blur > 0.0 || self.shadow_offset != Point::ZERO)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = DrawState::new(8, 4);
        assert_eq!(state.global_alpha, 1.0);
        assert_eq!(state.op, CompositeOp::SourceOver);
        assert_eq!(state.line_width, 1.0);
        assert_eq!(state.miter_limit, 10.0);
        assert_eq!(state.line_cap, LineCap::Butt);
        assert_eq!(state.line_join, LineJoin::Miter);
        assert!(state.dash_pattern.is_empty());
        assert_eq!(state.clip_mask.len(), 8);
        assert!(!state.shadow_enabled());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut state = DrawState::new(4, 4);
        let snapshot = state.clone();
        state.dash_pattern.push(5.0);
        state.clip_mask.clear();
        assert!(snapshot.dash_pattern.is_empty());
        assert_eq!(snapshot.clip_mask.len(), 8);
    }

    #[test]
    fn test_shadow_enabled_conditions() {
        let mut state = DrawState::new(4, 4);
        state.shadow_color = Rgba::new(0.0, 0.0, 0.0, 0.5);
        // Color alone is not enough.
        assert!(!state.shadow_enabled());
        state.shadow_blur = 2.0;
        assert!(state.shadow_enabled());
        state.shadow_blur = 0.0;
        state.shadow_offset = Point::new(0.0, 4.0);
        assert!(state.shadow_enabled());
        state.shadow_color = Rgba::TRANSPARENT;
        assert!(!state.shadow_enabled());
    }
}
