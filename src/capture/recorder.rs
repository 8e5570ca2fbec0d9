use crate::audio::transport::{AudioTransport, EndedSubscription, TransportEvent};
use crate::capture::download::{Blob, DownloadTarget, export_file_name, unix_millis_now};
use crate::capture::encoder::{EncoderEvent, EncoderFactory, MediaEncoder};
use crate::capture::format::{BASELINE, CodecSupport, negotiate};
use crate::capture::stream::{CaptureClock, CaptureStream, fit_frame};
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::render::surface::FrameRGBA;
use std::path::PathBuf;

/// Shown when the negotiated encoder cannot be built and the baseline one is used instead.
pub const FALLBACK_NOTICE: &str =
    "Preferred recording format is not supported here. Falling back to WebM.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Negotiating,
    Recording,
    /// Stop requested; waiting for the encoder to flush and the file to be delivered.
    Finalizing,
}

/// User-facing notices (the blocking alert of an interactive host).
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, message: &str) {
        tracing::warn!(notice = message, "user notice");
    }
}

/// The single active recording.
pub struct RecordingSession {
    mime_type: String,
    file_extension: String,
    chunks: Vec<Vec<u8>>,
    is_recording: bool,

    encoder: Box<dyn MediaEncoder>,
    stream: CaptureStream,
    clock: CaptureClock,
    started_at: Option<f64>,
    ended_subscription: Option<EndedSubscription>,
    stop_requested: bool,
}

impl RecordingSession {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_captured(&self) -> u64 {
        self.clock.frames_emitted()
    }

    pub fn stream(&self) -> &CaptureStream {
        &self.stream
    }
}

/// A delivered export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: usize,
    /// Failure reported by the encoder; the file holds whatever it produced before.
    pub encoder_error: Option<String>,
}

/// Owns the recording session and drives negotiation, chunk collection and finalization.
pub struct Recorder {
    support: Box<dyn CodecSupport>,
    factory: Box<dyn EncoderFactory>,
    notifier: Box<dyn Notifier>,
    downloads: Box<dyn DownloadTarget>,
    state: CaptureState,
    session: Option<RecordingSession>,
}

impl Recorder {
    pub fn new(
        support: impl CodecSupport + 'static,
        factory: impl EncoderFactory + 'static,
        notifier: impl Notifier + 'static,
        downloads: impl DownloadTarget + 'static,
    ) -> Self {
        Self {
            support: Box::new(support),
            factory: Box::new(factory),
            notifier: Box::new(notifier),
            downloads: Box::new(downloads),
            state: CaptureState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_recording)
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Start recording `stream` from the top of the audio. No-op while a session is active.
    ///
    /// The transport is paused, rewound and subscribed to for its end before the encoder starts;
    /// playback resumes once the session is marked recording.
    #[tracing::instrument(skip_all)]
    pub fn export(
        &mut self,
        stream: CaptureStream,
        transport: &mut dyn AudioTransport,
    ) -> SpectroResult<()> {
        if self.session.is_some() {
            tracing::debug!("export already in progress");
            return Ok(());
        }

        let clock = CaptureClock::new(stream.fps)?;
        self.state = CaptureState::Negotiating;
        let format = negotiate(self.support.as_ref());
        let (mut encoder, mime_type, extension) = match self.factory.create(&stream, Some(&format))
        {
            Ok(encoder) => (encoder, format.mime_type, format.extension),
            Err(err) => {
                tracing::warn!(mime = format.mime_type, %err, "encoder construction failed");
                self.notifier.notify(FALLBACK_NOTICE);
                match self.factory.create(&stream, None) {
                    Ok(encoder) => (encoder, BASELINE.mime_type, BASELINE.extension),
                    Err(err) => return Err(self.fail_start(err)),
                }
            }
        };

        transport.pause();
        transport.seek(0.0);
        let subscription = transport.subscribe_ended();

        if let Err(err) = encoder.start() {
            transport.unsubscribe_ended(subscription);
            return Err(self.fail_start(err));
        }

        self.session = Some(RecordingSession {
            mime_type: mime_type.to_owned(),
            file_extension: extension.to_owned(),
            chunks: Vec::new(),
            is_recording: true,
            encoder,
            clock,
            stream,
            started_at: None,
            ended_subscription: Some(subscription),
            stop_requested: false,
        });
        self.state = CaptureState::Recording;
        tracing::info!(mime = mime_type, "export started");

        transport.play();
        Ok(())
    }

    fn fail_start(&mut self, err: SpectroError) -> SpectroError {
        self.state = CaptureState::Idle;
        let message = format!("Recording could not be started: {err}");
        tracing::error!(%err, "recording could not be started");
        self.notifier.notify(&message);
        SpectroError::capture(message)
    }

    /// Feed the current canvas frame at `now_sec` (any monotonic clock). Returns how many frames
    /// were pushed to keep the capture track at its fixed rate.
    pub fn capture_frame(&mut self, frame: &FrameRGBA, now_sec: f64) -> SpectroResult<u64> {
        let Some(session) = self.session.as_mut() else {
            return Ok(0);
        };
        if !session.is_recording || session.stop_requested {
            return Ok(0);
        }

        let started_at = *session.started_at.get_or_insert(now_sec);
        let due = session.clock.frames_due(now_sec - started_at);
        if due == 0 {
            return Ok(0);
        }

        let frame = fit_frame(frame, session.stream.viewport)?;
        for pushed in 0..due {
            if let Err(err) = session.encoder.push_frame(&frame) {
                tracing::warn!(%err, "encoder rejected a frame; finishing the export early");
                self.stop()?;
                return Ok(pushed);
            }
        }
        Ok(due)
    }

    /// Request finalization. No-op when idle or already stopping; completion arrives through
    /// [`Recorder::pump`].
    pub fn stop(&mut self) -> SpectroResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if !session.is_recording || session.stop_requested {
            return Ok(());
        }
        session.stop_requested = true;
        self.state = CaptureState::Finalizing;
        tracing::info!(frames = session.clock.frames_emitted(), "export stop requested");
        session.encoder.request_stop()
    }

    /// Stop when the audio-end subscription of the active session fires.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> SpectroResult<()> {
        let TransportEvent::Ended(subscription) = event;
        let ours = self
            .session
            .as_ref()
            .is_some_and(|s| s.ended_subscription == Some(subscription));
        if ours {
            self.stop()?;
        }
        Ok(())
    }

    /// Drain encoder output. On the encoder's terminal event the export is finalized and
    /// delivered.
    pub fn pump(
        &mut self,
        transport: &mut dyn AudioTransport,
    ) -> SpectroResult<Option<ExportOutcome>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let mut stopped = None;
        while let Some(event) = session.encoder.try_event() {
            match event {
                EncoderEvent::Data(bytes) => {
                    if !bytes.is_empty() {
                        session.chunks.push(bytes);
                    }
                }
                EncoderEvent::Stopped(outcome) => {
                    stopped = Some(outcome);
                    break;
                }
            }
        }

        match stopped {
            Some(outcome) => self.finalize(outcome, transport).map(Some),
            None => Ok(None),
        }
    }

    fn finalize(
        &mut self,
        outcome: Result<(), String>,
        transport: &mut dyn AudioTransport,
    ) -> SpectroResult<ExportOutcome> {
        self.state = CaptureState::Finalizing;
        let Some(mut session) = self.session.take() else {
            self.state = CaptureState::Idle;
            return Err(SpectroError::capture("no recording session to finalize"));
        };
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "encoder reported a failure; delivering partial output");
        }

        session.is_recording = false;
        if let Some(subscription) = session.ended_subscription.take() {
            transport.unsubscribe_ended(subscription);
        }
        let blob = Blob::from_chunks(session.mime_type.as_str(), &session.chunks);
        session.chunks.clear();
        self.state = CaptureState::Idle;

        let file_name = export_file_name(unix_millis_now(), &session.file_extension);
        let path = match self.downloads.deliver(&file_name, &blob) {
            Ok(path) => path,
            Err(err) => {
                let message = format!("Export could not be saved: {err}");
                self.notifier.notify(&message);
                return Err(SpectroError::capture(message));
            }
        };

        Ok(ExportOutcome {
            path,
            file_name,
            bytes: blob.len(),
            mime_type: blob.mime_type,
            encoder_error: outcome.err(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/recorder.rs"]
mod tests;
