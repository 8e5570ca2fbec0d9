use crate::foundation::core::{BezPath, Viewport};
use crate::foundation::error::SpectroResult;

/// A rendered frame as premultiplied RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// 2-D drawing surface the render loop paints into.
pub trait DrawSurface {
    fn viewport(&self) -> Viewport;

    /// Reallocate for new pixel dimensions. Contents are undefined until the next `clear`.
    fn resize(&mut self, viewport: Viewport) -> SpectroResult<()>;

    /// Reset every pixel to transparent.
    fn clear(&mut self) -> SpectroResult<()>;

    /// Fill `path` with a straight-alpha RGBA8 color, screen-blended (`s + d - s*d`) over the
    /// current contents so overlapping shapes brighten rather than occlude.
    fn fill_path(&mut self, path: &BezPath, rgba: [u8; 4]) -> SpectroResult<()>;

    /// Current contents as premultiplied RGBA8.
    fn pixels(&self) -> &[u8];

    fn snapshot(&self) -> FrameRGBA {
        let vp = self.viewport();
        FrameRGBA {
            width: vp.width,
            height: vp.height,
            data: self.pixels().to_vec(),
            premultiplied: true,
        }
    }
}
