/// Producer of byte-scaled frequency magnitudes (`0..=255` per bin).
///
/// Implementations refresh the output in place on every call; callers never hold on to the data
/// across frames.
pub trait SpectrumSource {
    /// Sampling rate of the analysed signal in Hz.
    fn sample_rate(&self) -> u32;
    /// Number of frequency bins written by [`SpectrumSource::byte_frequency_data`].
    fn bin_count(&self) -> usize;
    /// Overwrite `out` with the current spectrum. `out.len()` must equal `bin_count()`;
    /// extra entries are zeroed, missing ones are not written.
    fn byte_frequency_data(&mut self, out: &mut [u8]);
}

/// Per-frame spectrum buffer, allocated once and overwritten in place.
#[derive(Debug, Clone)]
pub struct SpectrumSnapshot {
    bins: Vec<u8>,
    sample_rate: u32,
}

impl SpectrumSnapshot {
    pub fn for_source(source: &dyn SpectrumSource) -> Self {
        Self {
            bins: vec![0; source.bin_count()],
            sample_rate: source.sample_rate(),
        }
    }

    /// Pull a fresh spectrum from `source`, resizing only if the source resolution changed.
    pub fn refresh(&mut self, source: &mut dyn SpectrumSource) {
        let n = source.bin_count();
        if self.bins.len() != n {
            self.bins.resize(n, 0);
        }
        self.sample_rate = source.sample_rate();
        source.byte_frequency_data(&mut self.bins);
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Fixed spectrum, for tests and still renders.
#[derive(Debug, Clone)]
pub struct StaticSpectrum {
    pub sample_rate: u32,
    pub bins: Vec<u8>,
}

impl SpectrumSource for StaticSpectrum {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn bin_count(&self) -> usize {
        self.bins.len()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let n = out.len().min(self.bins.len());
        out[..n].copy_from_slice(&self.bins[..n]);
        out[n..].fill(0);
    }
}
