use crate::foundation::core::Viewport;
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::render::surface::FrameRGBA;
use std::borrow::Cow;
use std::path::PathBuf;

/// Frame rate of the captured canvas track, independent of the display rate.
pub const CAPTURE_FPS: u32 = 60;

/// Canvas video track plus the audio track an export muxes together.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureStream {
    pub viewport: Viewport,
    pub fps: u32,
    /// Source of the audio track; `None` records video only.
    pub audio_path: Option<PathBuf>,
}

impl CaptureStream {
    pub fn new(viewport: Viewport, audio_path: Option<PathBuf>) -> Self {
        Self {
            viewport,
            fps: CAPTURE_FPS,
            audio_path,
        }
    }
}

/// Decides how many canvas frames the capture track owes for the elapsed recording time.
///
/// Frame `n` covers `[n/fps, (n+1)/fps)`; a frame is owed as soon as its interval starts, so a slow
/// display duplicates the current frame and a fast one skips ticks.
#[derive(Clone, Debug)]
pub struct CaptureClock {
    fps: u32,
    emitted: u64,
}

impl CaptureClock {
    pub fn new(fps: u32) -> SpectroResult<Self> {
        if fps == 0 {
            return Err(SpectroError::validation("capture fps must be non-zero"));
        }
        Ok(Self { fps, emitted: 0 })
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }

    /// Number of copies of the current frame to emit at `elapsed_sec` into the recording.
    pub fn frames_due(&mut self, elapsed_sec: f64) -> u64 {
        let elapsed = if elapsed_sec.is_finite() {
            elapsed_sec.max(0.0)
        } else {
            0.0
        };
        // Tolerance keeps exact multiples of the period from landing one frame short.
        let target = (elapsed * f64::from(self.fps) + 1e-9).floor() as u64 + 1;
        let due = target.saturating_sub(self.emitted);
        self.emitted = self.emitted.max(target);
        due
    }
}

/// Nearest-neighbour rescale of `frame` to `viewport`; borrows when sizes already match.
pub fn fit_frame(frame: &FrameRGBA, viewport: Viewport) -> SpectroResult<Cow<'_, FrameRGBA>> {
    if frame.width == viewport.width && frame.height == viewport.height {
        return Ok(Cow::Borrowed(frame));
    }
    let src_len = frame.width as usize * frame.height as usize * 4;
    if frame.width == 0 || frame.height == 0 || frame.data.len() != src_len {
        return Err(SpectroError::capture(format!(
            "cannot rescale malformed {}x{} frame",
            frame.width, frame.height
        )));
    }

    let (sw, sh) = (frame.width as usize, frame.height as usize);
    let (dw, dh) = (viewport.width as usize, viewport.height as usize);
    let mut data = vec![0u8; viewport.pixel_len()];
    for y in 0..dh {
        let sy = (y * sh / dh).min(sh - 1);
        for x in 0..dw {
            let sx = (x * sw / dw).min(sw - 1);
            let s = (sy * sw + sx) * 4;
            let d = (y * dw + x) * 4;
            data[d..d + 4].copy_from_slice(&frame.data[s..s + 4]);
        }
    }
    Ok(Cow::Owned(FrameRGBA {
        width: viewport.width,
        height: viewport.height,
        data,
        premultiplied: frame.premultiplied,
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/stream.rs"]
mod tests;
