use crate::foundation::error::{SpectroError, SpectroResult};

/// Largest byte energy produced by a [`crate::SpectrumSource`].
pub const MAX_ENERGY: f64 = 255.0;

/// Map a byte-scale energy to `[0, 1]`.
pub fn normalize_energy(energy: f64) -> f64 {
    (energy / MAX_ENERGY).clamp(0.0, 1.0)
}

/// Single-pole exponential moving average, one state value per band.
///
/// `state += (e - state) * alpha` each frame. State starts at zero and lives as long as the render
/// loop; resizing the canvas does not touch it.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    alpha: f64,
    state: Vec<f64>,
}

impl TemporalSmoother {
    pub fn new(bands: usize, alpha: f64) -> SpectroResult<Self> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(SpectroError::validation(format!(
                "smoothing coefficient must be in (0, 1), got {alpha}"
            )));
        }
        Ok(Self {
            alpha,
            state: vec![0.0; bands],
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Advance band `index` one frame toward `normalized` and return the new amplitude.
    pub fn update(&mut self, index: usize, normalized: f64) -> f64 {
        if index >= self.state.len() {
            self.state.resize(index + 1, 0.0);
        }
        let s = &mut self.state[index];
        *s += (normalized - *s) * self.alpha;
        *s
    }

    pub fn amplitude(&self, index: usize) -> f64 {
        self.state.get(index).copied().unwrap_or(0.0)
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.state
    }
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/smooth.rs"]
mod tests;
