//! Error type for canvas construction.
//!
//! Construction over an unusable surface is the only recoverable error this
//! crate reports. Everything after construction follows the canvas model:
//! invalid parameters are silently ignored, save-stack misuse is fatal.

/// Largest supported canvas dimension, in pixels.
pub const MAX_DIMENSION: u32 = 32_768;

/// Why a canvas could not be created.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("surface dimensions {width}x{height} outside 1..={MAX_DIMENSION}")]
    InvalidDimensions { width: u32, height: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_dimensions() {
        let err = CanvasError::InvalidDimensions {
            width: 0,
            height: 40_000,
        };
        let text = err.to_string();
        assert!(text.contains("0x40000"));
        assert!(text.contains("32768"));
    }
}
