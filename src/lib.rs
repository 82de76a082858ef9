//! # canvas2d
//!
//! A single-threaded, CPU-based 2D vector rasterizer with an immediate-mode
//! API modeled on the HTML5 2D canvas: paths, strokes, fills, clips,
//! shadows, gradients, patterns, and affine transforms, rendered with
//! anti-aliasing and gamma-correct premultiplied-alpha blending into a
//! caller-supplied pixel buffer.
//!
//! ## Pipeline
//!
//! A draw call flows through five stages:
//!
//! 1. **Path construction**: cubic Bezier subpaths built in canvas space
//! 2. **Tessellation**: adaptive subdivision under flatness and angular
//!    bounds, with cusps isolated at extrema splits
//! 3. **Dashing and stroke expansion**: pattern walking, then half-stroke
//!    tracing with joins and caps
//! 4. **Scan conversion**: polygons to sorted, signed-coverage pixel runs
//! 5. **Compositing**: the run stream merged with the clip mask and
//!    blended through one of the canvas composite operations, with an
//!    optional Gaussian-approximate shadow pass first
//!
//! ## Example
//!
//! ```
//! use canvas2d::{Canvas, PixelFormat, Pixmap, Rgba, Style};
//!
//! let mut pixmap = Pixmap::new(256, 256, PixelFormat::Rgba8);
//! let mut canvas = Canvas::new(&mut pixmap).unwrap();
//! canvas.set_color(Style::Fill, Rgba::new(0.1, 0.4, 0.9, 1.0));
//! canvas.begin_path();
//! canvas.arc(128.0, 128.0, 80.0, 0.0, 7.0, false);
//! canvas.fill();
//! canvas.set_color(Style::Stroke, Rgba::new(1.0, 1.0, 1.0, 1.0));
//! canvas.set_line_width(6.0);
//! canvas.stroke();
//! ```

pub mod basics;
pub mod bezier;
pub mod canvas;
pub mod clip;
pub mod color;
pub mod composite;
pub mod dash;
pub mod error;
pub mod gamma;
pub mod math;
pub mod matrix;
pub mod paint;
pub mod path;
pub mod rasterizer;
pub mod shadow;
pub mod state;
pub mod stroke;
pub mod surface;

pub use basics::Point;
pub use canvas::{Canvas, Style};
pub use color::Rgba;
pub use composite::CompositeOp;
pub use error::CanvasError;
pub use gamma::Gamma;
pub use matrix::Matrix;
pub use paint::Repetition;
pub use stroke::{LineCap, LineJoin};
pub use surface::{PixelFormat, Pixmap, Surface};
