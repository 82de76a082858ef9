//! RGBA color with premultiplication and gamma conversion.
//!
//! The rendering core keeps every color premultiplied and linearized; input
//! colors arrive unpremultiplied in gamma space and output pixels leave the
//! same way. [`Rgba`] carries the four `f32` channels; which convention a
//! given value uses is a matter of pipeline position.

use core::ops::{Add, Mul};

use crate::gamma::Gamma;

/// Alpha values below this threshold are treated as fully transparent:
/// unpremultiplying such a color collapses it to transparent black.
pub const ALPHA_EPSILON: f32 = 1.0 / 8160.0;

// ============================================================================
// Rgba
// ============================================================================

/// An RGBA color with `f32` channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply the color channels by alpha.
    #[inline]
    pub fn premultiplied(self) -> Rgba {
        Rgba::new(self.r * self.a, self.g * self.a, self.b * self.a, self.a)
    }

    /// Divide the color channels by alpha. Below [`ALPHA_EPSILON`] the
    /// division is meaningless and the result is transparent black.
    #[inline]
    pub fn unpremultiplied(self) -> Rgba {
        if self.a < ALPHA_EPSILON {
            return Rgba::TRANSPARENT;
        }
        let inv = 1.0 / self.a;
        Rgba::new(self.r * inv, self.g * inv, self.b * inv, self.a)
    }

    /// Apply the gamma curve to the color channels (alpha untouched).
    #[inline]
    pub fn linearized(self, gamma: Gamma) -> Rgba {
        Rgba::new(
            gamma.linearize(self.r),
            gamma.linearize(self.g),
            gamma.linearize(self.b),
            self.a,
        )
    }

    /// Invert the gamma curve on the color channels (alpha untouched).
    #[inline]
    pub fn delinearized(self, gamma: Gamma) -> Rgba {
        Rgba::new(
            gamma.delinearize(self.r),
            gamma.delinearize(self.g),
            gamma.delinearize(self.b),
            self.a,
        )
    }

    /// All channels clamped to `[0, 1]`.
    #[inline]
    pub fn clamped(self) -> Rgba {
        Rgba::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// Channel-wise linear interpolation toward `other`.
    #[inline]
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        Rgba::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Convert an input color (unpremultiplied, gamma space) into the
    /// rendering core's working form (premultiplied, linear).
    #[inline]
    pub fn into_working(self, gamma: Gamma) -> Rgba {
        self.clamped().linearized(gamma).premultiplied()
    }
}

impl Add for Rgba {
    type Output = Rgba;
    #[inline]
    fn add(self, rhs: Rgba) -> Rgba {
        Rgba::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}

impl Mul<f32> for Rgba {
    type Output = Rgba;
    #[inline]
    fn mul(self, rhs: f32) -> Rgba {
        Rgba::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

// ============================================================================
// Tests
// ============================================================================
