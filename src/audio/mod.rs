//! Audio input: decoding through the system `ffmpeg` and a virtual playback transport.

pub(crate) mod decode;
pub(crate) mod transport;
