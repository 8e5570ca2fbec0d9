use crate::analysis::extract::band_energy;
use crate::analysis::smooth::{TemporalSmoother, normalize_energy};
use crate::analysis::spectrum::{SpectrumSnapshot, SpectrumSource};
use crate::config::color::BandColor;
use crate::config::model::VisualizerConfig;
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::render::surface::DrawSurface;
use crate::render::waveform::{WaveInput, synthesize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No frame has run yet.
    Idle,
    /// Frames are being produced; there is no way back to `Idle`.
    Running,
}

/// What one frame did, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub bands_drawn: usize,
    /// Smoothed amplitude per band after this frame.
    pub amplitudes: Vec<f64>,
}

/// Per-frame extraction, smoothing, synthesis and drawing of every configured band.
///
/// The configuration is an immutable snapshot; runtime changes (colors, intensity) publish a new
/// snapshot that takes effect from the next frame.
pub struct Visualizer {
    config: Arc<VisualizerConfig>,
    smoother: TemporalSmoother,
    snapshot: Option<SpectrumSnapshot>,
    intensity: f64,
    state: LoopState,
    frames: u64,
}

impl Visualizer {
    pub fn new(config: Arc<VisualizerConfig>) -> SpectroResult<Self> {
        config.validate()?;
        let smoother = TemporalSmoother::new(config.waves.len(), config.smoothing_time_constant)?;
        Ok(Self {
            intensity: config.intensity,
            config,
            smoother,
            snapshot: None,
            state: LoopState::Idle,
            frames: 0,
        })
    }

    pub fn config(&self) -> &Arc<VisualizerConfig> {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn amplitudes(&self) -> &[f64] {
        self.smoother.amplitudes()
    }

    pub fn set_intensity(&mut self, intensity: f64) -> SpectroResult<()> {
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(SpectroError::validation(format!(
                "intensity must be finite and non-negative, got {intensity}"
            )));
        }
        self.intensity = intensity;
        Ok(())
    }

    pub fn set_band_color(&mut self, index: usize, color: BandColor) -> SpectroResult<()> {
        let next = self.config.with_band_color(index, color)?;
        self.config = Arc::new(next);
        Ok(())
    }

    /// Swap in a new configuration snapshot. The band table must keep its shape; smoothing state
    /// carries over.
    pub fn publish_config(&mut self, config: Arc<VisualizerConfig>) -> SpectroResult<()> {
        config.validate()?;
        if config.waves.len() != self.config.waves.len() {
            return Err(SpectroError::validation(
                "published config must keep the same number of bands",
            ));
        }
        self.config = config;
        Ok(())
    }

    /// Run one frame: clear, refresh the spectrum, then per band extract, normalize, smooth,
    /// synthesize and draw.
    pub fn render_frame(
        &mut self,
        source: &mut dyn SpectrumSource,
        surface: &mut dyn DrawSurface,
        time_sec: f64,
    ) -> SpectroResult<FrameReport> {
        self.state = LoopState::Running;
        let config = Arc::clone(&self.config);
        let viewport = surface.viewport();

        surface.clear()?;
        let snapshot = self
            .snapshot
            .get_or_insert_with(|| SpectrumSnapshot::for_source(&*source));
        snapshot.refresh(source);

        let mut bands_drawn = 0;
        for (index, band) in config.waves.iter().enumerate() {
            let energy = band_energy(snapshot.bins(), snapshot.sample_rate(), band.range);
            let amplitude = self.smoother.update(index, normalize_energy(energy));

            let input = WaveInput {
                amplitude,
                amplitude_factor: band.amplitude_factor,
                phase_shift: band.phase_shift,
                intensity: self.intensity,
                band_index: index,
                viewport,
                time_sec,
            };
            let Some(shape) = synthesize(&input) else {
                continue;
            };
            let rgba = band.color.to_rgba8_straight();
            surface.fill_path(&shape.to_path(), rgba)?;
            bands_drawn += 1;
        }

        self.frames += 1;
        tracing::trace!(frame = self.frames, bands_drawn, "visualizer frame");
        Ok(FrameReport {
            bands_drawn,
            amplitudes: self.smoother.amplitudes().to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/visualizer.rs"]
mod tests;
