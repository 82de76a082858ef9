//! The canvas: immediate-mode drawing over a borrowed surface.
//!
//! [`Canvas`] owns the drawing state, the user path, and every scratch
//! buffer the pipeline needs, and borrows its pixel surface for its whole
//! lifetime. A draw call flows: build path -> flatten -> (dash ->
//! stroke-expand -> flatten) -> scan-convert -> optional shadow pass ->
//! composite through the clip mask. Scratch vectors are reset at the start
//! of each call and reused, never shrunk.
//!
//! Parameter validation follows the canvas model: invalid values are
//! silently ignored, and only save-stack misuse is fatal.

use crate::basics::Point;
use crate::bezier::{flatten, stroke_angular_limit};
use crate::clip::intersect_mask;
use crate::color::Rgba;
use crate::composite::{blend_runs, BlendParams, BrushSource, CompositeOp};
use crate::dash::dash_lines;
use crate::error::{CanvasError, MAX_DIMENSION};
use crate::gamma::Gamma;
use crate::matrix::Matrix;
use crate::paint::{Brush, Painter, Repetition};
use crate::path::{BezierPath, LinePath};
use crate::rasterizer::{PixelRun, Rasterizer};
use crate::shadow::{ShadowPass, ShadowSource};
use crate::state::{DrawState, SAVE_STACK_DEPTH};
use crate::stroke::{LineCap, LineJoin, Stroker};
use crate::surface::Surface;

/// Which brush a paint-setting call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Fill,
    Stroke,
}

// ============================================================================
// Canvas
// ============================================================================

/// An immediate-mode 2D canvas rasterizing into a borrowed [`Surface`].
pub struct Canvas<'a, S: Surface> {
    surface: &'a mut S,
    width: u32,
    height: u32,
    gamma: Gamma,
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezierPath,
    path_scratch: BezierPath,
    lines: LinePath,
    dashed: LinePath,
    stroked: BezierPath,
    runs: Vec<PixelRun>,
    shadow_runs: Vec<PixelRun>,
    mask_scratch: Vec<PixelRun>,
    span: Vec<Rgba>,
    rasterizer: Rasterizer,
    stroker: Stroker,
    shadow: ShadowPass,
}

impl<'a, S: Surface> Canvas<'a, S> {
    /// A canvas over `surface` with the standard sRGB gamma pipeline.
    pub fn new(surface: &'a mut S) -> Result<Self, CanvasError> {
        Self::with_gamma(surface, Gamma::Srgb)
    }

    /// A canvas over `surface` with an explicit gamma curve.
    pub fn with_gamma(surface: &'a mut S, gamma: Gamma) -> Result<Self, CanvasError> {
        let width = surface.width();
        let height = surface.height();
        if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        log::debug!("canvas {}x{}, {:?} gamma", width, height, gamma);
        Ok(Self {
            surface,
            width,
            height,
            gamma,
            state: DrawState::new(width as u16, height as u16),
            stack: Vec::new(),
            path: BezierPath::new(),
            path_scratch: BezierPath::new(),
            lines: LinePath::new(),
            dashed: LinePath::new(),
            stroked: BezierPath::new(),
            runs: Vec::new(),
            shadow_runs: Vec::new(),
            mask_scratch: Vec::new(),
            span: Vec::new(),
            rasterizer: Rasterizer::new(),
            stroker: Stroker::new(),
            shadow: ShadowPass::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn gamma(&self) -> Gamma {
        self.gamma
    }

    pub fn surface(&self) -> &S {
        &*self.surface
    }

    // ========================================================================
    // State stack
    // ========================================================================

    /// Push a copy of the drawing state. Exceeding the stack depth is a
    /// programming error.
    pub fn save(&mut self) {
        assert!(
            self.stack.len() < SAVE_STACK_DEPTH,
            "canvas save stack overflow (depth {})",
            SAVE_STACK_DEPTH
        );
        self.stack.push(self.state.clone());
    }

    /// Pop the most recently saved state. Popping an empty stack is a
    /// programming error.
    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(prior) => self.state = prior,
            None => panic!("canvas restore without matching save"),
        }
    }

    // ========================================================================
    // Transform
    // ========================================================================

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.matrix.concat(Matrix::translation(x, y));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.matrix.concat(Matrix::scaling(x, y));
    }

    pub fn rotate(&mut self, angle: f32) {
        self.state.matrix.concat(Matrix::rotation(angle));
    }

    /// Compose an arbitrary matrix onto the current transform. A singular
    /// result leaves the transform unchanged.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.state.matrix.concat(Matrix::new(a, b, c, d, e, f));
    }

    /// Replace the current transform. A singular matrix is ignored.
    pub fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.state.matrix.set(Matrix::new(a, b, c, d, e, f));
    }

    pub fn matrix(&self) -> Matrix {
        self.state.matrix.forward
    }

    // ========================================================================
    // Compositing and shadow state
    // ========================================================================

    /// Set the global alpha. Values outside `[0, 1]` are ignored.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    pub fn set_global_composite_operation(&mut self, op: CompositeOp) {
        self.state.op = op;
    }

    pub fn global_composite_operation(&self) -> CompositeOp {
        self.state.op
    }

    /// Set the shadow color (unpremultiplied, gamma space).
    pub fn set_shadow_color(&mut self, color: Rgba) {
        self.state.shadow_color = color.into_working(self.gamma);
    }

    /// Set the shadow blur. Negative values are ignored.
    pub fn set_shadow_blur(&mut self, blur: f32) {
        if blur >= 0.0 {
            self.state.shadow_blur = blur;
        }
    }

    pub fn set_shadow_offset_x(&mut self, x: f32) {
        self.state.shadow_offset.x = x;
    }

    pub fn set_shadow_offset_y(&mut self, y: f32) {
        self.state.shadow_offset.y = y;
    }

    // ========================================================================
    // Line style
    // ========================================================================

    /// Set the line width. Zero and negative widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    pub fn line_cap(&self) -> LineCap {
        self.state.line_cap
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    pub fn line_join(&self) -> LineJoin {
        self.state.line_join
    }

    /// Set the miter limit. Non-positive values are ignored.
    pub fn set_miter_limit(&mut self, limit: f32) {
        if limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    pub fn miter_limit(&self) -> f32 {
        self.state.miter_limit
    }

    /// Set the dash pattern. A pattern with any negative entry is ignored;
    /// an odd-length pattern is stored duplicated. Empty disables dashing.
    pub fn set_line_dash(&mut self, segments: &[f32]) {
        if segments.iter().any(|&s| s < 0.0) {
            return;
        }
        self.state.dash_pattern.clear();
        self.state.dash_pattern.extend_from_slice(segments);
        if segments.len() % 2 == 1 {
            self.state.dash_pattern.extend_from_slice(segments);
        }
    }

    pub fn line_dash(&self) -> &[f32] {
        &self.state.dash_pattern
    }

    pub fn set_line_dash_offset(&mut self, offset: f32) {
        self.state.dash_offset = offset;
    }

    pub fn line_dash_offset(&self) -> f32 {
        self.state.dash_offset
    }

    // ========================================================================
    // Brushes
    // ========================================================================

    fn brush_mut(&mut self, style: Style) -> &mut Brush {
        match style {
            Style::Fill => &mut self.state.fill_brush,
            Style::Stroke => &mut self.state.stroke_brush,
        }
    }

    /// Paint with a solid color (unpremultiplied, gamma space).
    pub fn set_color(&mut self, style: Style, color: Rgba) {
        let working = color.into_working(self.gamma);
        *self.brush_mut(style) = Brush::Color(working);
    }

    /// Paint with a linear gradient between two user-space points. The new
    /// gradient starts with no stops (transparent until stops are added).
    pub fn set_linear_gradient(&mut self, style: Style, x0: f32, y0: f32, x1: f32, y1: f32) {
        *self.brush_mut(style) = Brush::Linear {
            start: Point::new(x0, y0),
            end: Point::new(x1, y1),
            stops: Default::default(),
        };
    }

    /// Paint with a two-circle radial gradient. Negative radii are ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn set_radial_gradient(
        &mut self,
        style: Style,
        x0: f32,
        y0: f32,
        r0: f32,
        x1: f32,
        y1: f32,
        r1: f32,
    ) {
        if r0 < 0.0 || r1 < 0.0 {
            return;
        }
        *self.brush_mut(style) = Brush::Radial {
            start: Point::new(x0, y0),
            end: Point::new(x1, y1),
            start_radius: r0,
            end_radius: r1,
            stops: Default::default(),
        };
    }

    /// Add a gradient stop. Ignored when the brush is not a gradient or the
    /// offset is outside `[0, 1]`.
    pub fn add_color_stop(&mut self, style: Style, offset: f32, color: Rgba) {
        if !(0.0..=1.0).contains(&offset) {
            return;
        }
        let working = color.into_working(self.gamma);
        if let Some(stops) = self.brush_mut(style).stops_mut() {
            stops.add(offset, working);
        }
    }

    /// Paint with a tiled image. `pixels` is row-major RGBA8, unpremultiplied
    /// gamma space; the brush owns a converted copy. Degenerate or
    /// undersized images are ignored.
    pub fn set_pattern(
        &mut self,
        style: Style,
        pixels: &[u8],
        width: usize,
        height: usize,
        repetition: Repetition,
    ) {
        let Some(converted) = convert_pattern(pixels, width, height, self.gamma) else {
            return;
        };
        *self.brush_mut(style) = Brush::Pattern {
            pixels: converted,
            width,
            height,
            repetition,
        };
    }

    // ========================================================================
    // Path building
    // ========================================================================

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        let p = self.state.matrix.forward.apply(Point::new(x, y));
        self.path.move_to(p);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        let p = self.state.matrix.forward.apply(Point::new(x, y));
        self.path.line_to(p);
    }

    pub fn close_path(&mut self) {
        self.path.close();
    }

    /// Quadratic curve, lifted to a cubic with controls 2/3 of the way
    /// toward the quadratic control point.
    pub fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let control = self.state.matrix.forward.apply(Point::new(cx, cy));
        let to = self.state.matrix.forward.apply(Point::new(x, y));
        let from = self.path.last_point().unwrap_or(control);
        self.path.curve_to(
            from + (control - from) * (2.0 / 3.0),
            to + (control - to) * (2.0 / 3.0),
            to,
        );
    }

    pub fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.path.curve_to(
            self.state.matrix.forward.apply(Point::new(c1x, c1y)),
            self.state.matrix.forward.apply(Point::new(c2x, c2y)),
            self.state.matrix.forward.apply(Point::new(x, y)),
        );
    }

    /// Arc from the current point toward `(x1, y1)` then `(x2, y2)`,
    /// rounded with `radius`. Nearly collinear tangents degenerate to a
    /// line; a negative radius is ignored.
    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        if radius < 0.0 {
            return;
        }
        let corner = Point::new(x1, y1);
        let Some(last) = self.path.last_point() else {
            self.move_to(x1, y1);
            return;
        };
        let from = self.state.matrix.inverse.apply(last);
        let toward_from = crate::math::normalized(from - corner);
        let toward_to = crate::math::normalized(Point::new(x2, y2) - corner);
        let sine = crate::math::cross(toward_from, toward_to);
        if sine.abs() < 1e-4 || radius == 0.0 {
            self.line_to(x1, y1);
            return;
        }

        let cosine = crate::math::dot(toward_from, toward_to).clamp(-1.0, 1.0);
        let half_angle = ((1.0 - cosine) * 0.5).sqrt().asin();
        let tangent_distance = radius / half_angle.tan();
        let center = corner
            + crate::math::normalized(toward_from + toward_to) * (radius / half_angle.sin());
        let tangent_1 = corner + toward_from * tangent_distance;
        let tangent_2 = corner + toward_to * tangent_distance;

        self.line_to(tangent_1.x, tangent_1.y);
        let a1 = (tangent_1.y - center.y).atan2(tangent_1.x - center.x);
        let a2 = (tangent_2.y - center.y).atan2(tangent_2.x - center.x);
        let mut sweep = a2 - a1;
        while sweep > core::f32::consts::PI {
            sweep -= 2.0 * core::f32::consts::PI;
        }
        while sweep < -core::f32::consts::PI {
            sweep += 2.0 * core::f32::consts::PI;
        }
        self.emit_arc(center, radius, a1, sweep);
    }

    /// Circular arc around `(x, y)`. The span is normalized modulo a full
    /// turn (clamped to one full circle) in the requested direction; a
    /// negative radius is ignored.
    pub fn arc(&mut self, x: f32, y: f32, radius: f32, a1: f32, a2: f32, counterclockwise: bool) {
        if radius < 0.0 {
            return;
        }
        let tau = 2.0 * core::f32::consts::PI;
        let sweep = if counterclockwise {
            if a1 - a2 >= tau {
                -tau
            } else {
                -((a1 - a2).rem_euclid(tau))
            }
        } else if a2 - a1 >= tau {
            tau
        } else {
            (a2 - a1).rem_euclid(tau)
        };
        self.emit_arc(Point::new(x, y), radius, a1, sweep);
    }

    /// Emit an arc as a line to its start plus cubic segments, all in user
    /// space.
    fn emit_arc(&mut self, center: Point, radius: f32, start_angle: f32, sweep: f32) {
        let tau = 2.0 * core::f32::consts::PI;
        let on_circle =
            |angle: f32| center + Point::new(angle.cos(), angle.sin()) * radius;
        let start = on_circle(start_angle);
        self.line_to(start.x, start.y);
        if sweep == 0.0 || radius == 0.0 {
            return;
        }

        let segments = (16.0 * sweep.abs() / tau).ceil().max(1.0);
        let step = sweep / segments;
        let tangent_scale = (4.0 / 3.0) * (step / 4.0).tan() * radius;
        let mut angle = start_angle;
        for _ in 0..segments as usize {
            let next = angle + step;
            let from = on_circle(angle);
            let to = on_circle(next);
            let control_1 = from + Point::new(-angle.sin(), angle.cos()) * tangent_scale;
            let control_2 = to - Point::new(-next.sin(), next.cos()) * tangent_scale;
            self.path.curve_to(
                self.state.matrix.forward.apply(control_1),
                self.state.matrix.forward.apply(control_2),
                self.state.matrix.forward.apply(to),
            );
            angle = next;
        }
    }

    /// Append a rectangle as its own closed subpath.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Fill the current path (nonzero winding).
    pub fn fill(&mut self) {
        self.lines.clear();
        flatten(&self.path, -1.0, &mut self.lines);
        self.render(Style::Fill);
    }

    /// Stroke the current path with the current line style.
    pub fn stroke(&mut self) {
        if self.state.line_width <= 0.0 {
            return;
        }
        self.lines.clear();
        flatten(
            &self.path,
            stroke_angular_limit(self.state.line_width),
            &mut self.lines,
        );

        let pattern_total: f32 = self.state.dash_pattern.iter().sum();
        if !self.state.dash_pattern.is_empty() && pattern_total > 0.0 {
            self.dashed.clear();
            dash_lines(
                &self.lines,
                &self.state.dash_pattern,
                self.state.dash_offset,
                &self.state.matrix.inverse,
                &mut self.dashed,
            );
            core::mem::swap(&mut self.lines, &mut self.dashed);
        }

        self.stroked.clear();
        self.stroker.expand(
            &self.lines,
            self.state.line_width,
            self.state.line_cap,
            self.state.line_join,
            self.state.miter_limit,
            &self.state.matrix,
            &mut self.stroked,
        );
        self.lines.clear();
        flatten(&self.stroked, -1.0, &mut self.lines);
        self.render(Style::Stroke);
    }

    /// Intersect the clip mask with the filled current path.
    pub fn clip(&mut self) {
        self.lines.clear();
        flatten(&self.path, -1.0, &mut self.lines);
        self.rasterizer
            .convert(&self.lines, Point::ZERO, self.width, self.height, &mut self.runs);
        intersect_mask(&self.state.clip_mask, &self.runs, &mut self.mask_scratch);
        core::mem::swap(&mut self.state.clip_mask, &mut self.mask_scratch);
    }

    /// Composite `self.lines` through shadow and main passes.
    fn render(&mut self, style: Style) {
        self.rasterizer
            .convert(&self.lines, Point::ZERO, self.width, self.height, &mut self.runs);
        log::trace!("{:?} pass: {} runs", style, self.runs.len());

        if self.state.shadow_enabled() {
            self.render_shadow();
        }

        let brush = match style {
            Style::Fill => &self.state.fill_brush,
            Style::Stroke => &self.state.stroke_brush,
        };
        let source = BrushSource {
            painter: Painter::new(brush, &self.state.matrix.inverse),
            inverse: self.state.matrix.inverse,
        };
        let params = BlendParams {
            global_alpha: self.state.global_alpha,
            op: self.state.op,
            width: self.width,
            height: self.height,
        };
        blend_runs(
            &mut *self.surface,
            self.gamma,
            &self.runs,
            &self.state.clip_mask,
            &source,
            &params,
            &mut self.span,
        );
    }

    /// Scan-convert into the padded shadow grid, blur, and composite.
    fn render_shadow(&mut self) {
        let blur = self.state.shadow_blur;
        self.shadow.prepare(self.width, self.height, blur);
        let border = self.shadow.border();
        let offset = Point::new(
            border as f32 + self.state.shadow_offset.x,
            border as f32 + self.state.shadow_offset.y,
        );
        let padding = 2 * border as u32;
        self.rasterizer.convert(
            &self.lines,
            offset,
            self.width + padding,
            self.height + padding,
            &mut self.shadow_runs,
        );
        self.shadow.accumulate(&self.shadow_runs);
        self.shadow.blur(blur);
        self.shadow
            .span_runs(self.width, self.height, &mut self.shadow_runs);

        let source = ShadowSource {
            pass: &self.shadow,
            color: self.state.shadow_color,
        };
        let params = BlendParams {
            global_alpha: self.state.global_alpha,
            op: self.state.op,
            width: self.width,
            height: self.height,
        };
        blend_runs(
            &mut *self.surface,
            self.gamma,
            &self.shadow_runs,
            &self.state.clip_mask,
            &source,
            &params,
            &mut self.span,
        );
    }

    // ========================================================================
    // Rectangle conveniences
    // ========================================================================

    /// Fill a rectangle without touching the current path.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width == 0.0 || height == 0.0 {
            return;
        }
        core::mem::swap(&mut self.path, &mut self.path_scratch);
        self.path.clear();
        self.rect(x, y, width, height);
        self.fill();
        core::mem::swap(&mut self.path, &mut self.path_scratch);
    }

    /// Stroke a rectangle without touching the current path.
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width == 0.0 && height == 0.0 {
            return;
        }
        core::mem::swap(&mut self.path, &mut self.path_scratch);
        self.path.clear();
        self.rect(x, y, width, height);
        self.stroke();
        core::mem::swap(&mut self.path, &mut self.path_scratch);
    }

    /// Clear a rectangle to transparent black, ignoring the composite
    /// operation, global alpha, and shadows.
    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width == 0.0 || height == 0.0 {
            return;
        }
        let saved_alpha = self.state.global_alpha;
        let saved_op = self.state.op;
        let saved_shadow = self.state.shadow_color;
        let saved_brush = core::mem::replace(
            &mut self.state.fill_brush,
            Brush::Color(Rgba::new(0.0, 0.0, 0.0, 1.0)),
        );
        self.state.global_alpha = 1.0;
        self.state.op = CompositeOp::DestinationOut;
        self.state.shadow_color = Rgba::TRANSPARENT;

        self.fill_rect(x, y, width, height);

        self.state.global_alpha = saved_alpha;
        self.state.op = saved_op;
        self.state.shadow_color = saved_shadow;
        self.state.fill_brush = saved_brush;
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Draw a row-major RGBA8 image onto the rectangle `(dx, dy, dw, dh)`,
    /// resampled bicubically and honoring the full compositing state.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image(
        &mut self,
        pixels: &[u8],
        width: usize,
        height: usize,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) {
        if dw == 0.0 || dh == 0.0 {
            return;
        }
        let Some(converted) = convert_pattern(pixels, width, height, self.gamma) else {
            return;
        };
        let saved_matrix = self.state.matrix;
        let saved_brush = core::mem::replace(
            &mut self.state.fill_brush,
            Brush::Pattern {
                pixels: converted,
                width,
                height,
                repetition: Repetition::NoRepeat,
            },
        );
        self.translate(dx, dy);
        self.scale(dw / width as f32, dh / height as f32);
        self.fill_rect(0.0, 0.0, width as f32, height as f32);
        self.state.matrix = saved_matrix;
        self.state.fill_brush = saved_brush;
    }

    /// Read back a rectangle as RGBA8 (unpremultiplied, gamma space).
    /// Pixels outside the canvas come back transparent black.
    pub fn get_image_data(&mut self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        for row in 0..height as i32 {
            let source_y = y + row;
            if source_y < 0 || source_y >= self.height as i32 {
                continue;
            }
            let x0 = x.max(0);
            let x1 = (x + width as i32).min(self.width as i32);
            if x0 >= x1 {
                continue;
            }
            self.span.resize((x1 - x0) as usize, Rgba::TRANSPARENT);
            self.surface
                .read_span(x0 as u32, source_y as u32, &mut self.span);
            let row_base = row as usize * width as usize * 4;
            for (i, c) in self.span.iter().enumerate() {
                let at = row_base + ((x0 - x) as usize + i) * 4;
                data[at] = quantize(c.r);
                data[at + 1] = quantize(c.g);
                data[at + 2] = quantize(c.b);
                data[at + 3] = quantize(c.a);
            }
        }
        data
    }

    /// Write RGBA8 pixels verbatim: no compositing, clip, transform, or
    /// alpha. The rectangle is clipped to the canvas.
    pub fn put_image_data(&mut self, pixels: &[u8], width: u32, height: u32, x: i32, y: i32) {
        if pixels.len() < width as usize * height as usize * 4 {
            return;
        }
        for row in 0..height as i32 {
            let target_y = y + row;
            if target_y < 0 || target_y >= self.height as i32 {
                continue;
            }
            let x0 = x.max(0);
            let x1 = (x + width as i32).min(self.width as i32);
            if x0 >= x1 {
                continue;
            }
            self.span.clear();
            let row_base = (row as usize * width as usize + (x0 - x) as usize) * 4;
            self.span.extend(
                pixels[row_base..row_base + (x1 - x0) as usize * 4]
                    .chunks_exact(4)
                    .map(|p| {
                        Rgba::new(
                            p[0] as f32 / 255.0,
                            p[1] as f32 / 255.0,
                            p[2] as f32 / 255.0,
                            p[3] as f32 / 255.0,
                        )
                    }),
            );
            self.surface.write_span(x0 as u32, target_y as u32, &self.span);
        }
    }
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Convert RGBA8 image bytes into working-form pattern pixels.
fn convert_pattern(pixels: &[u8], width: usize, height: usize, gamma: Gamma) -> Option<Vec<Rgba>> {
    if width == 0 || height == 0 || pixels.len() < width * height * 4 {
        return None;
    }
    Some(
        pixels[..width * height * 4]
            .chunks_exact(4)
            .map(|p| {
                Rgba::new(
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                )
                .into_working(gamma)
            })
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================
