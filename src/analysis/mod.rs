//! Spectrum analysis: the spectrum source seam, band energy extraction and temporal smoothing.

pub(crate) mod analyser;
pub(crate) mod extract;
pub(crate) mod smooth;
pub(crate) mod spectrum;
