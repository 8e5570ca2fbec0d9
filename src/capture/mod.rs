//! Capture/export pipeline: format negotiation, the ffmpeg-backed encoder, frame pacing, the
//! recording session state machine and delivery of the finished file.

pub(crate) mod download;
pub(crate) mod encoder;
pub(crate) mod ffmpeg;
pub(crate) mod format;
pub(crate) mod recorder;
pub(crate) mod stream;
