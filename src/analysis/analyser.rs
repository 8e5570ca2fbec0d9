//! Short-time spectrum analysis over decoded PCM with Web-Audio-analyser byte semantics.

use crate::analysis::spectrum::SpectrumSource;
use crate::config::model::VisualizerConfig;
use crate::foundation::error::{SpectroError, SpectroResult};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Time smoothing applied to bin magnitudes between analyses.
pub const DEFAULT_ANALYSER_SMOOTHING: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyserOpts {
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl AnalyserOpts {
    pub fn from_config(cfg: &VisualizerConfig) -> Self {
        Self {
            fft_size: cfg.fft_size,
            smoothing_time_constant: DEFAULT_ANALYSER_SMOOTHING,
            min_decibels: cfg.min_decibels as f32,
            max_decibels: cfg.max_decibels as f32,
        }
    }

    fn validate(&self) -> SpectroResult<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(SpectroError::validation(format!(
                "analyser fft size must be a power of two in [32, 32768], got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(SpectroError::validation(
                "analyser smoothing must be in [0, 1)",
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(SpectroError::validation(
                "analyser min_decibels must be below max_decibels",
            ));
        }
        Ok(())
    }
}

/// Spectrum source over a mono PCM buffer.
///
/// Each call to [`SpectrumSource::byte_frequency_data`] analyses the `fft_size` samples ending at
/// the playhead. With no playhead (paused or stopped) the input is silence, so the smoothed
/// magnitudes decay toward zero instead of freezing.
pub struct PcmAnalyser {
    pcm: Arc<[f32]>,
    sample_rate: u32,
    opts: AnalyserOpts,
    playhead_sec: Option<f64>,

    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl PcmAnalyser {
    pub fn new(pcm: Arc<[f32]>, sample_rate: u32, opts: AnalyserOpts) -> SpectroResult<Self> {
        opts.validate()?;
        if sample_rate == 0 {
            return Err(SpectroError::validation("analyser sample rate must be non-zero"));
        }

        let n = opts.fft_size;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Ok(Self {
            pcm,
            sample_rate,
            opts,
            playhead_sec: None,
            fft,
            window: (0..n).map(|i| blackman_window(i, n)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); n],
            scratch,
            smoothed: vec![0.0; n / 2],
        })
    }

    /// Position to analyse at, in seconds; `None` feeds silence.
    pub fn set_playhead(&mut self, playhead_sec: Option<f64>) {
        self.playhead_sec = playhead_sec;
    }

    pub fn duration_sec(&self) -> f64 {
        self.pcm.len() as f64 / f64::from(self.sample_rate)
    }

    fn load_window(&mut self) {
        let n = self.opts.fft_size;
        let end = match self.playhead_sec {
            Some(t) if t.is_finite() && t > 0.0 => {
                (t * f64::from(self.sample_rate)).round() as usize
            }
            _ => 0,
        };
        let end = end.min(self.pcm.len());
        let start = end.saturating_sub(n);
        let lead = n - (end - start);

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < lead {
                0.0
            } else {
                self.pcm[start + i - lead]
            };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
    }
}

impl SpectrumSource for PcmAnalyser {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn bin_count(&self) -> usize {
        self.opts.fft_size / 2
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.load_window();
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let n = self.opts.fft_size as f32;
        let tau = self.opts.smoothing_time_constant;
        let db_min = self.opts.min_decibels;
        let db_range = self.opts.max_decibels - db_min;

        for (k, m) in self.smoothed.iter_mut().enumerate() {
            let mag = self.buffer[k].norm() / n;
            *m = tau * *m + (1.0 - tau) * mag;
        }

        let bins = out.len().min(self.smoothed.len());
        for (dst, &m) in out[..bins].iter_mut().zip(&self.smoothed) {
            *dst = magnitude_to_byte(m, db_min, db_range);
        }
        out[bins..].fill(0);
    }
}

fn magnitude_to_byte(m: f32, db_min: f32, db_range: f32) -> u8 {
    if m <= 0.0 || !m.is_finite() {
        return 0;
    }
    let db = 20.0 * m.log10();
    let scaled = (255.0 / db_range * (db - db_min)).floor();
    scaled.clamp(0.0, 255.0) as u8
}

/// Blackman window (alpha = 0.16) over a periodic frame of `size` samples.
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/analyser.rs"]
mod tests;
