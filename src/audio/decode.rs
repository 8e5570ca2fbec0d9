use crate::foundation::error::{SpectroError, SpectroResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sample rate audio is decoded to for analysis.
pub const ANALYSIS_SAMPLE_RATE: u32 = 48_000;

/// Decoded mono PCM plus the file it came from (the export muxes that file as its audio
/// track).
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    pub source_path: PathBuf,
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode any ffmpeg-readable audio file to mono `f32` PCM at `sample_rate`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn decode_audio_mono(path: &Path, sample_rate: u32) -> SpectroResult<DecodedAudio> {
    if sample_rate == 0 {
        return Err(SpectroError::validation("decode sample rate must be non-zero"));
    }
    if !path.is_file() {
        return Err(SpectroError::analysis(format!(
            "audio file '{}' does not exist",
            path.display()
        )));
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            SpectroError::analysis(format!(
                "failed to run ffmpeg for audio decode (is it installed and on PATH?): {e}"
            ))
        })?;

    if !out.status.success() {
        return Err(SpectroError::analysis(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let samples = pcm_from_f32le(&out.stdout)?;
    if samples.is_empty() {
        return Err(SpectroError::analysis(format!(
            "'{}' contains no audio samples",
            path.display()
        )));
    }
    tracing::debug!(samples = samples.len(), sample_rate, "decoded audio");

    Ok(DecodedAudio {
        source_path: path.to_path_buf(),
        sample_rate,
        samples: samples.into(),
    })
}

pub(crate) fn pcm_from_f32le(bytes: &[u8]) -> SpectroResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(SpectroError::analysis(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
