use std::ops::RangeInclusive;

/// Map a frequency range in Hz onto an inclusive bin-index range.
///
/// Indices are `round(hz / nyquist * bin_count)`, clamped to `[0, bin_count - 1]`. Returns `None`
/// when nothing remains (inverted range, range entirely above nyquist, or no bins).
pub fn band_bin_range(
    range_hz: (f64, f64),
    sample_rate: u32,
    bin_count: usize,
) -> Option<RangeInclusive<usize>> {
    if bin_count == 0 || sample_rate == 0 {
        return None;
    }
    let nyquist = f64::from(sample_rate) / 2.0;
    let n = bin_count as f64;
    let low = (range_hz.0 / nyquist * n).round();
    let high = (range_hz.1 / nyquist * n).round();
    if !(low.is_finite() && high.is_finite()) || high < low {
        return None;
    }

    let last = (bin_count - 1) as f64;
    let low = low.max(0.0);
    let high = high.min(last);
    if low > high {
        return None;
    }
    Some(low as usize..=high as usize)
}

/// Average energy (`0..=255`) of the bins covering `range_hz`; 0 for an empty mapping.
pub fn band_energy(bins: &[u8], sample_rate: u32, range_hz: (f64, f64)) -> f64 {
    let Some(range) = band_bin_range(range_hz, sample_rate, bins.len()) else {
        return 0.0;
    };
    let slice = &bins[range];
    if slice.is_empty() {
        return 0.0;
    }
    let sum: u64 = slice.iter().map(|&b| u64::from(b)).sum();
    sum as f64 / slice.len() as f64
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/extract.rs"]
mod tests;
