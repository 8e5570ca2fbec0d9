//! Procedural wave geometry for one band.

use crate::foundation::core::{BezPath, Point, Viewport};

/// Horizontal distance between sampled wave points, in pixels.
pub const WAVE_STEP_PX: f64 = 5.0;
/// Scaled amplitudes below this are not drawn.
pub const SILENCE_THRESHOLD: f64 = 0.1;
/// Spatial carrier frequency added per band index (radians per pixel).
pub const SPATIAL_FREQ_PER_BAND: f64 = 0.0005;
/// Secondary component runs at this multiple of the carrier frequency.
pub const SECONDARY_FREQ_RATIO: f64 = 2.5;
pub const SECONDARY_WEIGHT: f64 = 0.5;

/// Everything needed to shape one band's wave for one frame.
#[derive(Clone, Copy, Debug)]
pub struct WaveInput {
    /// Smoothed amplitude in `[0, 1]`.
    pub amplitude: f64,
    pub amplitude_factor: f64,
    pub phase_shift: f64,
    pub intensity: f64,
    pub band_index: usize,
    pub viewport: Viewport,
    /// Seconds on the render loop's monotonic clock.
    pub time_sec: f64,
}

impl WaveInput {
    /// `a * amplitude_factor * (H / 4) * intensity`.
    pub fn scaled_amplitude(&self) -> f64 {
        scaled_amplitude(
            self.amplitude,
            self.amplitude_factor,
            f64::from(self.viewport.height),
            self.intensity,
        )
    }

    pub fn spatial_frequency(&self) -> f64 {
        self.band_index as f64 * SPATIAL_FREQ_PER_BAND
    }
}

pub fn scaled_amplitude(amplitude: f64, amplitude_factor: f64, height: f64, intensity: f64) -> f64 {
    amplitude * amplitude_factor * (height / 4.0) * intensity
}

/// Parabolic edge window squared: 0 at both edges, 1 at the center.
pub fn edge_attenuation(norm_x: f64) -> f64 {
    let p = 4.0 * norm_x * (1.0 - norm_x);
    p * p
}

/// Vertical displacement at `x` for an already scaled amplitude.
pub fn displacement(x: f64, width: f64, freq: f64, phase: f64, amplitude: f64, t: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    let attenuation = edge_attenuation(x / width);
    let primary = (x * freq + phase).sin() * (2.0 * t).sin();
    let secondary = (x * freq * SECONDARY_FREQ_RATIO + phase).sin() * (1.5 * t).cos();
    (primary + SECONDARY_WEIGHT * secondary) * amplitude * attenuation
}

/// Sampled wave outline around the vertical center of the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveShape {
    pub baseline_y: f64,
    pub width: f64,
    /// Samples at `x = 0, step, 2*step, ... <= width`.
    pub points: Vec<Point>,
}

impl WaveShape {
    /// Closed fill path: baseline at the left edge, every sample, baseline at the right edge.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(Point::new(0.0, self.baseline_y));
        for &p in &self.points {
            path.line_to(p);
        }
        path.line_to(Point::new(self.width, self.baseline_y));
        path.close_path();
        path
    }
}

/// Shape the wave for one band, or `None` when it is too quiet to draw.
pub fn synthesize(input: &WaveInput) -> Option<WaveShape> {
    let amplitude = input.scaled_amplitude();
    if amplitude.is_nan() || amplitude < SILENCE_THRESHOLD {
        return None;
    }

    let width = f64::from(input.viewport.width);
    let baseline_y = f64::from(input.viewport.height) / 2.0;
    let freq = input.spatial_frequency();
    let samples = (width / WAVE_STEP_PX).floor() as usize + 1;

    let points = (0..samples)
        .map(|i| {
            let x = i as f64 * WAVE_STEP_PX;
            let y = displacement(x, width, freq, input.phase_shift, amplitude, input.time_sec);
            Point::new(x, baseline_y + y)
        })
        .collect();

    Some(WaveShape {
        baseline_y,
        width,
        points,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/waveform.rs"]
mod tests;
