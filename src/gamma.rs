//! Gamma transfer curves.
//!
//! The rendering core blends in linear light; pixels and input colors live
//! in gamma space. The curve is chosen once at canvas creation and applied
//! on every scanline read/write and brush color conversion. Alpha is never
//! gamma-encoded.

// ============================================================================
// Gamma
// ============================================================================

/// Gamma transfer curve applied to the RGB channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gamma {
    /// Identity; blend directly in storage space.
    None,
    /// Approximate 2.0 power curve: squaring linearizes, square root encodes.
    Pow2,
    /// The standard sRGB piecewise curve.
    #[default]
    Srgb,
}

impl Gamma {
    /// Convert a gamma-space channel to linear light.
    #[inline]
    pub fn linearize(self, c: f32) -> f32 {
        match self {
            Gamma::None => c,
            Gamma::Pow2 => c * c,
            Gamma::Srgb => {
                if c < 0.04045 {
                    c / 12.92
                } else {
                    ((c + 0.055) / 1.055).powf(2.4)
                }
            }
        }
    }

    /// Convert a linear-light channel back to gamma space.
    #[inline]
    pub fn delinearize(self, c: f32) -> f32 {
        match self {
            Gamma::None => c,
            Gamma::Pow2 => c.max(0.0).sqrt(),
            Gamma::Srgb => {
                if c < 0.003_130_8 {
                    c * 12.92
                } else {
                    1.055 * c.max(0.0).powf(1.0 / 2.4) - 0.055
                }
            }
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
    fn test_endpoints_are_fixed() {
        for gamma in [Gamma::None, Gamma::Pow2, Gamma::Srgb] {
            assert!((gamma.linearize(0.0)).abs() < 1e-6);
            assert!((gamma.linearize(1.0) - 1.0).abs() < 1e-6);
            assert!((gamma.delinearize(0.0)).abs() < 1e-6);
            assert!((gamma.delinearize(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_roundtrip() {
        for gamma in [Gamma::None, Gamma::Pow2, Gamma::Srgb] {
            for i in 0..=100 {
                let c = i as f32 / 100.0;
                let roundtrip = gamma.delinearize(gamma.linearize(c));
                assert!(
                    (roundtrip - c).abs() < 1e-5,
                    "{:?}: {} -> {}",
                    gamma,
                    c,
                    roundtrip
                );
            }
        }
    }

    #[test]
    fn test_srgb_reference_values() {
        // 0.5 in sRGB is about 0.2140 linear.
        assert!((Gamma::Srgb.linearize(0.5) - 0.21404114).abs() < 1e-5);
        // The piecewise toe is linear.
        assert!((Gamma::Srgb.linearize(0.03) - 0.03 / 12.92).abs() < 1e-7);
    }

    #[test]
    fn test_pow2_is_squaring() {
        assert!((Gamma::Pow2.linearize(0.5) - 0.25).abs() < 1e-7);
        assert!((Gamma::Pow2.delinearize(0.25) - 0.5).abs() < 1e-7);
    }
}
