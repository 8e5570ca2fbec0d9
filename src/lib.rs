//! SpectroFlow renders an audio-reactive waveform animation from decoded audio and records the
//! animation together with the audio into a video file.
//!
//! The per-frame pipeline is:
//!
//! - A [`SpectrumSource`] (normally a [`PcmAnalyser`]) yields byte magnitudes per frequency bin
//! - Each configured band's mean energy is smoothed over time
//! - The [`Visualizer`] synthesizes one tapered, screen-blended wave per band onto a
//!   [`DrawSurface`]
//!
//! A [`Recorder`] captures the surface at a fixed 60 fps alongside the audio track through a
//! [`MediaEncoder`] (the system `ffmpeg` by default) and delivers the finished file.
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod analysis;
pub(crate) mod app;
pub(crate) mod audio;
pub(crate) mod capture;
pub(crate) mod config;
pub(crate) mod render;

pub use crate::foundation::core::{BezPath, Point, Viewport};
pub use crate::foundation::error::{SpectroError, SpectroResult};

pub use crate::analysis::analyser::{AnalyserOpts, DEFAULT_ANALYSER_SMOOTHING, PcmAnalyser};
pub use crate::analysis::extract::{band_bin_range, band_energy};
pub use crate::analysis::smooth::{MAX_ENERGY, TemporalSmoother, normalize_energy};
pub use crate::analysis::spectrum::{SpectrumSnapshot, SpectrumSource, StaticSpectrum};
pub use crate::app::{App, BoundaryEvent, render_still, run_export};
pub use crate::audio::decode::{ANALYSIS_SAMPLE_RATE, DecodedAudio, decode_audio_mono};
pub use crate::audio::transport::{
    AudioTransport, Clock, EndedSubscription, ManualClock, PlaybackClock, SystemClock,
    TransportEvent,
};
pub use crate::capture::download::{
    Blob, DirectoryDownloads, DownloadTarget, export_file_name, unix_millis_now,
};
pub use crate::capture::encoder::{
    EncoderEvent, EncoderFactory, InMemoryEncoder, InMemoryEncoderFactory, MediaEncoder,
};
pub use crate::capture::ffmpeg::{
    FfmpegCapabilities, FfmpegEncoder, FfmpegEncoderFactory, is_ffmpeg_on_path,
};
pub use crate::capture::format::{
    BASELINE, CodecSupport, FormatDescriptor, PREFERENCE, StaticSupport, descriptor_for_mime,
    negotiate,
};
pub use crate::capture::recorder::{
    CaptureState, ExportOutcome, FALLBACK_NOTICE, Notifier, Recorder, RecordingSession,
    TracingNotifier,
};
pub use crate::capture::stream::{CAPTURE_FPS, CaptureClock, CaptureStream, fit_frame};
pub use crate::config::color::{BandColor, PICKED_COLOR_ALPHA};
pub use crate::config::model::{BandConfig, VisualizerConfig};
pub use crate::render::cpu::CpuCanvas;
pub use crate::render::scheduler::{
    FrameCallback, FrameScheduler, FrameTick, PacedScheduler, SteppedScheduler,
};
pub use crate::render::surface::{DrawSurface, FrameRGBA};
pub use crate::render::visualizer::{FrameReport, LoopState, Visualizer};
pub use crate::render::waveform::{
    SILENCE_THRESHOLD, WAVE_STEP_PX, WaveInput, WaveShape, synthesize,
};
