use crate::config::color::BandColor;
use crate::foundation::error::{SpectroError, SpectroResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One frequency band mapped to one visual wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandConfig {
    pub name: String,
    /// `(low_hz, high_hz)`, low < high.
    pub range: (f64, f64),
    pub color: BandColor,
    pub amplitude_factor: f64,
    pub phase_shift: f64,
}

impl BandConfig {
    pub fn new(
        name: impl Into<String>,
        range: (f64, f64),
        color: BandColor,
        amplitude_factor: f64,
        phase_shift: f64,
    ) -> Self {
        Self {
            name: name.into(),
            range,
            color,
            amplitude_factor,
            phase_shift,
        }
    }
}

/// Static visualizer configuration, fixed before the render loop starts.
///
/// Only band colors and `intensity` change at runtime, and only by publishing a new snapshot
/// between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualizerConfig {
    /// Analysis window length in samples; the spectrum has `fft_size / 2` bins.
    pub fft_size: usize,
    /// Per-frame exponential smoothing coefficient for band amplitudes, in `(0, 1)`.
    pub smoothing_time_constant: f64,
    pub min_decibels: f64,
    pub max_decibels: f64,
    /// Global amplitude multiplier.
    pub intensity: f64,
    pub waves: Vec<BandConfig>,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.29,
            min_decibels: -90.0,
            max_decibels: -10.0,
            intensity: 3.0,
            waves: default_waves(),
        }
    }
}

fn default_waves() -> Vec<BandConfig> {
    vec![
        BandConfig::new(
            "Bass",
            (20.0, 100.0),
            BandColor::rgba8(0, 168, 150, 0.5),
            0.8,
            0.0,
        ),
        BandConfig::new(
            "Low Mids",
            (100.0, 500.0),
            BandColor::rgba8(0, 128, 128, 0.5),
            1.0,
            1.0,
        ),
        BandConfig::new(
            "Mids",
            (500.0, 2000.0),
            BandColor::rgba8(50, 80, 180, 0.5),
            0.8,
            2.0,
        ),
        BandConfig::new(
            "High Mids",
            (2000.0, 6000.0),
            BandColor::rgba8(120, 40, 140, 0.5),
            1.2,
            3.0,
        ),
        BandConfig::new(
            "Highs",
            (6000.0, 20000.0),
            BandColor::rgba8(180, 20, 80, 0.5),
            1.2,
            4.0,
        ),
    ]
}

impl VisualizerConfig {
    pub fn from_json_str(s: &str) -> SpectroResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| SpectroError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_path(path: &Path) -> SpectroResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> SpectroResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpectroError::serde(e.to_string()))
    }

    /// Number of frequency bins the analysis produces.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn validate(&self) -> SpectroResult<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(SpectroError::validation(format!(
                "fftSize must be a power of two in [32, 32768], got {}",
                self.fft_size
            )));
        }
        let alpha = self.smoothing_time_constant;
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(SpectroError::validation(format!(
                "smoothingTimeConstant must be in (0, 1), got {alpha}"
            )));
        }
        if !(self.min_decibels.is_finite() && self.max_decibels.is_finite())
            || self.min_decibels >= self.max_decibels
        {
            return Err(SpectroError::validation(format!(
                "minDecibels ({}) must be below maxDecibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(SpectroError::validation(
                "intensity must be finite and non-negative",
            ));
        }
        if self.waves.is_empty() {
            return Err(SpectroError::validation("at least one wave band is required"));
        }
        for band in &self.waves {
            let (lo, hi) = band.range;
            if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || lo >= hi {
                return Err(SpectroError::validation(format!(
                    "band '{}' range must satisfy 0 <= low < high, got [{lo}, {hi}]",
                    band.name
                )));
            }
            if !band.amplitude_factor.is_finite() || !band.phase_shift.is_finite() {
                return Err(SpectroError::validation(format!(
                    "band '{}' amplitudeFactor/phaseShift must be finite",
                    band.name
                )));
            }
        }
        Ok(())
    }

    /// Check every band fits below the Nyquist frequency of `sample_rate`.
    pub fn validate_for_sample_rate(&self, sample_rate: u32) -> SpectroResult<()> {
        self.validate()?;
        let nyquist = f64::from(sample_rate) / 2.0;
        for band in &self.waves {
            if band.range.1 > nyquist {
                return Err(SpectroError::validation(format!(
                    "band '{}' upper bound {} Hz exceeds nyquist {nyquist} Hz",
                    band.name, band.range.1
                )));
            }
        }
        Ok(())
    }

    pub fn band_index(&self, name: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|b| b.name.eq_ignore_ascii_case(name))
    }

    /// Copy of this config with one band recolored.
    pub fn with_band_color(&self, index: usize, color: BandColor) -> SpectroResult<Self> {
        let mut next = self.clone();
        let band = next.waves.get_mut(index).ok_or_else(|| {
            SpectroError::validation(format!("band index {index} out of range"))
        })?;
        band.color = color;
        Ok(next)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
