use crate::foundation::error::{SpectroError, SpectroResult};

pub use kurbo::{BezPath, Point};

/// Pixel dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Create a validated viewport; both sides must be non-zero and fit the rasterizer (u16).
    pub fn new(width: u32, height: u32) -> SpectroResult<Self> {
        if width == 0 || height == 0 {
            return Err(SpectroError::validation(
                "viewport width/height must be non-zero",
            ));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(SpectroError::validation(format!(
                "viewport {width}x{height} exceeds {max}x{max}",
                max = u16::MAX
            )));
        }
        Ok(Self { width, height })
    }

    pub fn pixel_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Round both sides down to even values (yuv420p output needs even dimensions).
    pub fn even(self) -> Self {
        Self {
            width: (self.width & !1).max(2),
            height: (self.height & !1).max(2),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
