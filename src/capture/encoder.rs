use crate::capture::format::FormatDescriptor;
use crate::capture::stream::CaptureStream;
use crate::foundation::error::{SpectroError, SpectroResult};
use crate::render::surface::FrameRGBA;
use std::sync::mpsc;

/// Output of a running encoder, delivered through a channel and drained between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A piece of the encoded container, in output order.
    Data(Vec<u8>),
    /// Terminal signal after a stop request. `Err` carries the encoder's failure report.
    Stopped(Result<(), String>),
}

/// Streaming media encoder fed with canvas frames.
///
/// Lifecycle: `start`, any number of `push_frame`, `request_stop`, then poll `try_event` until
/// [`EncoderEvent::Stopped`] arrives.
pub trait MediaEncoder: Send {
    fn mime_type(&self) -> &str;

    fn start(&mut self) -> SpectroResult<()>;

    fn push_frame(&mut self, frame: &FrameRGBA) -> SpectroResult<()>;

    /// Ask the encoder to finish. Returns immediately; completion is reported as `Stopped`.
    fn request_stop(&mut self) -> SpectroResult<()>;

    /// Next pending event, never blocking.
    fn try_event(&mut self) -> Option<EncoderEvent>;
}

/// Builds encoders for a capture stream.
pub trait EncoderFactory {
    /// `format = None` asks for the unparameterized baseline encoder.
    fn create(
        &self,
        stream: &CaptureStream,
        format: Option<&FormatDescriptor>,
    ) -> SpectroResult<Box<dyn MediaEncoder>>;
}

/// Encoder that emits each pushed frame's bytes as one chunk. Used by tests and dry runs.
#[derive(Debug)]
pub struct InMemoryEncoder {
    mime_type: String,
    tx: Option<mpsc::Sender<EncoderEvent>>,
    rx: mpsc::Receiver<EncoderEvent>,
    started: bool,
    frames: u64,
}

impl InMemoryEncoder {
    pub fn new(mime_type: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            mime_type: mime_type.into(),
            tx: Some(tx),
            rx,
            started: false,
            frames: 0,
        }
    }

    pub fn frames_pushed(&self) -> u64 {
        self.frames
    }
}

impl MediaEncoder for InMemoryEncoder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self) -> SpectroResult<()> {
        if self.started {
            return Err(SpectroError::capture("encoder already started"));
        }
        self.started = true;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> SpectroResult<()> {
        let tx = match (&self.tx, self.started) {
            (Some(tx), true) => tx,
            _ => return Err(SpectroError::capture("encoder is not accepting frames")),
        };
        self.frames += 1;
        tx.send(EncoderEvent::Data(frame.data.clone()))
            .map_err(|_| SpectroError::capture("encoder channel closed"))
    }

    fn request_stop(&mut self) -> SpectroResult<()> {
        if let Some(tx) = self.tx.take() {
            // A closed receiver means nobody waits for the signal.
            let _ = tx.send(EncoderEvent::Stopped(Ok(())));
        }
        Ok(())
    }

    fn try_event(&mut self) -> Option<EncoderEvent> {
        self.rx.try_recv().ok()
    }
}

/// Factory for [`InMemoryEncoder`]s tagged with the negotiated mime type.
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryEncoderFactory;

impl EncoderFactory for InMemoryEncoderFactory {
    fn create(
        &self,
        _stream: &CaptureStream,
        format: Option<&FormatDescriptor>,
    ) -> SpectroResult<Box<dyn MediaEncoder>> {
        let mime = format.map_or(crate::capture::format::BASELINE.mime_type, |f| f.mime_type);
        Ok(Box::new(InMemoryEncoder::new(mime)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/encoder.rs"]
mod tests;
