//! Host wiring: one cooperative timeline that applies boundary events, renders a frame, feeds
//! the recorder and relays transport events.

use crate::analysis::analyser::{AnalyserOpts, PcmAnalyser};
use crate::audio::decode::DecodedAudio;
use crate::audio::transport::{AudioTransport, ManualClock};
use crate::capture::recorder::{ExportOutcome, Recorder};
use crate::capture::stream::{CAPTURE_FPS, CaptureStream};
use crate::config::color::BandColor;
use crate::config::model::VisualizerConfig;
use crate::foundation::core::Viewport;
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::render::cpu::CpuCanvas;
use crate::render::scheduler::{FrameScheduler, FrameTick};
use crate::render::surface::{DrawSurface, FrameRGBA};
use crate::render::visualizer::{FrameReport, Visualizer};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

/// Changes requested from outside the render loop, applied at the start of the next frame.
#[derive(Clone, Debug, PartialEq)]
pub enum BoundaryEvent {
    Resize(Viewport),
    SetBandColor { index: usize, color: BandColor },
    SetIntensity(f64),
    StartExport,
    StopExport,
}

pub struct App<T: AudioTransport> {
    visualizer: Visualizer,
    analyser: PcmAnalyser,
    canvas: CpuCanvas,
    transport: T,
    recorder: Recorder,
    audio_source: Option<PathBuf>,
    tick_clock: Option<ManualClock>,

    events_tx: mpsc::Sender<BoundaryEvent>,
    events_rx: mpsc::Receiver<BoundaryEvent>,
    exports: Vec<ExportOutcome>,
    export_error: Option<SpectroError>,
}

impl<T: AudioTransport> App<T> {
    pub fn new(
        config: VisualizerConfig,
        audio: &DecodedAudio,
        viewport: Viewport,
        transport: T,
        recorder: Recorder,
    ) -> SpectroResult<Self> {
        config.validate_for_sample_rate(audio.sample_rate)?;
        let analyser = PcmAnalyser::new(
            Arc::clone(&audio.samples),
            audio.sample_rate,
            AnalyserOpts::from_config(&config),
        )?;
        let (events_tx, events_rx) = mpsc::channel();
        Ok(Self {
            visualizer: Visualizer::new(Arc::new(config))?,
            analyser,
            canvas: CpuCanvas::new(viewport)?,
            transport,
            recorder,
            audio_source: Some(audio.source_path.clone()),
            tick_clock: None,
            events_tx,
            events_rx,
            exports: Vec::new(),
            export_error: None,
        })
    }

    /// Record video only, without muxing the source audio.
    pub fn without_audio_track(mut self) -> Self {
        self.audio_source = None;
        self
    }

    /// Slave `clock` to frame time: it is set to each tick's time before the frame runs. Lets a
    /// transport built on the same clock play back in lockstep with a non-realtime scheduler.
    pub fn with_tick_clock(mut self, clock: ManualClock) -> Self {
        self.tick_clock = Some(clock);
        self
    }

    /// Sender for boundary events; usable from any thread.
    pub fn events(&self) -> mpsc::Sender<BoundaryEvent> {
        self.events_tx.clone()
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn canvas(&self) -> &CpuCanvas {
        &self.canvas
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Exports delivered since the last call.
    pub fn take_exports(&mut self) -> Vec<ExportOutcome> {
        std::mem::take(&mut self.exports)
    }

    /// Why the last requested export could not start, if it failed. The loop keeps rendering
    /// after such a failure; the user has already been notified.
    pub fn take_export_error(&mut self) -> Option<SpectroError> {
        self.export_error.take()
    }

    /// One iteration of the loop.
    pub fn frame(&mut self, tick: FrameTick) -> SpectroResult<FrameReport> {
        if let Some(clock) = &self.tick_clock {
            clock.set(Duration::try_from_secs_f64(tick.time_sec).unwrap_or_default());
        }
        self.apply_boundary_events()?;

        let playhead = self
            .transport
            .is_playing()
            .then(|| self.transport.current_time());
        self.analyser.set_playhead(playhead);
        let report = self
            .visualizer
            .render_frame(&mut self.analyser, &mut self.canvas, tick.time_sec)?;

        if self.recorder.is_recording() {
            let frame = self.canvas.snapshot();
            self.recorder.capture_frame(&frame, tick.time_sec)?;
        }
        for event in self.transport.poll_events() {
            self.recorder.handle_transport_event(event)?;
        }
        if let Some(outcome) = self.recorder.pump(&mut self.transport)? {
            self.exports.push(outcome);
        }
        Ok(report)
    }

    fn apply_boundary_events(&mut self) -> SpectroResult<()> {
        while let Ok(event) = self.events_rx.try_recv() {
            tracing::debug!(?event, "boundary event");
            match event {
                BoundaryEvent::Resize(viewport) => self.canvas.resize(viewport)?,
                BoundaryEvent::SetBandColor { index, color } => {
                    if let Err(err) = self.visualizer.set_band_color(index, color) {
                        tracing::warn!(%err, index, "ignoring band color change");
                    }
                }
                BoundaryEvent::SetIntensity(intensity) => {
                    if let Err(err) = self.visualizer.set_intensity(intensity) {
                        tracing::warn!(%err, intensity, "ignoring intensity change");
                    }
                }
                BoundaryEvent::StartExport => {
                    let stream = CaptureStream::new(
                        self.canvas.viewport().even(),
                        self.audio_source.clone(),
                    );
                    if let Err(err) = self.recorder.export(stream, &mut self.transport) {
                        tracing::warn!(%err, "export did not start");
                        self.export_error = Some(err);
                    }
                }
                BoundaryEvent::StopExport => {
                    if let Err(err) = self.recorder.stop() {
                        tracing::warn!(%err, "export stop request failed");
                    }
                }
            }
        }
        Ok(())
    }
}

/// Start an export and drive `scheduler` until the file has been delivered.
#[tracing::instrument(skip_all)]
pub fn run_export<T: AudioTransport>(
    app: &mut App<T>,
    scheduler: &mut dyn FrameScheduler,
) -> SpectroResult<ExportOutcome> {
    app.events()
        .send(BoundaryEvent::StartExport)
        .map_err(|_| SpectroError::capture("boundary event channel closed"))?;

    let mut delivered = None;
    let frames = scheduler.run(&mut |tick| {
        app.frame(tick)?;
        if let Some(err) = app.take_export_error() {
            return Err(err);
        }
        if let Some(outcome) = app.take_exports().pop() {
            delivered = Some(outcome);
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    })?;
    tracing::info!(frames, "render loop finished");

    delivered.ok_or_else(|| {
        SpectroError::capture("render loop ended before the export was delivered")
    })
}

/// Render the frame shown `at_sec` into playback, warming the smoother over the preceding frames
/// at the capture rate.
#[tracing::instrument(skip(config, audio))]
pub fn render_still(
    config: VisualizerConfig,
    audio: &DecodedAudio,
    viewport: Viewport,
    at_sec: f64,
) -> SpectroResult<FrameRGBA> {
    if !at_sec.is_finite() || at_sec < 0.0 {
        return Err(SpectroError::validation(format!(
            "frame time must be a non-negative number of seconds, got {at_sec}"
        )));
    }
    config.validate_for_sample_rate(audio.sample_rate)?;
    let mut analyser = PcmAnalyser::new(
        Arc::clone(&audio.samples),
        audio.sample_rate,
        AnalyserOpts::from_config(&config),
    )?;
    let mut visualizer = Visualizer::new(Arc::new(config))?;
    let mut canvas = CpuCanvas::new(viewport)?;

    let fps = f64::from(CAPTURE_FPS);
    let last = (at_sec * fps).floor() as u64;
    for index in 0..=last {
        let t = if index == last { at_sec } else { index as f64 / fps };
        analyser.set_playhead(Some(t));
        visualizer.render_frame(&mut analyser, &mut canvas, t)?;
    }
    Ok(canvas.snapshot())
}

#[cfg(test)]
#[path = "../tests/unit/app.rs"]
mod tests;
