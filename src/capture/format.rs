use std::collections::BTreeSet;

/// A container/codec combination the recorder can ask an encoder for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub mime_type: &'static str,
    pub extension: &'static str,
    /// ffmpeg muxer (`-f`).
    pub muxer: &'static str,
    /// ffmpeg video encoder; `None` leaves the muxer default.
    pub video_codec: Option<&'static str>,
    /// ffmpeg audio encoder; `None` leaves the muxer default.
    pub audio_codec: Option<&'static str>,
}

/// Ordered from most to least preferred. The last entry is the generic streaming container.
pub const PREFERENCE: [FormatDescriptor; 4] = [
    FormatDescriptor {
        mime_type: "video/mp4;codecs=h264",
        extension: "mp4",
        muxer: "mp4",
        video_codec: Some("libx264"),
        audio_codec: Some("aac"),
    },
    FormatDescriptor {
        mime_type: "video/webm;codecs=h264",
        extension: "webm",
        muxer: "matroska",
        video_codec: Some("libx264"),
        audio_codec: Some("libopus"),
    },
    FormatDescriptor {
        mime_type: "video/webm;codecs=vp9",
        extension: "webm",
        muxer: "webm",
        video_codec: Some("libvpx-vp9"),
        audio_codec: Some("libopus"),
    },
    BASELINE,
];

/// Used when nothing in [`PREFERENCE`] is supported and for the unparameterized fallback encoder.
pub const BASELINE: FormatDescriptor = FormatDescriptor {
    mime_type: "video/webm",
    extension: "webm",
    muxer: "webm",
    video_codec: None,
    audio_codec: None,
};

/// Answers whether the runtime can record a given mime type.
pub trait CodecSupport {
    fn is_type_supported(&self, mime_type: &str) -> bool;
}

/// Pick the first supported entry of [`PREFERENCE`], else [`BASELINE`].
pub fn negotiate(support: &dyn CodecSupport) -> FormatDescriptor {
    let picked = PREFERENCE
        .iter()
        .copied()
        .find(|f| support.is_type_supported(f.mime_type))
        .unwrap_or(BASELINE);
    tracing::info!(mime = picked.mime_type, "negotiated capture format");
    picked
}

pub fn descriptor_for_mime(mime_type: &str) -> Option<FormatDescriptor> {
    PREFERENCE
        .iter()
        .copied()
        .find(|f| f.mime_type.eq_ignore_ascii_case(mime_type.trim()))
}

/// Fixed set of supported mime types.
#[derive(Clone, Debug, Default)]
pub struct StaticSupport {
    mime_types: BTreeSet<String>,
}

impl StaticSupport {
    pub fn new<I, S>(mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mime_types: mime_types
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn all() -> Self {
        Self::new(PREFERENCE.iter().map(|f| f.mime_type))
    }
}

impl CodecSupport for StaticSupport {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        self.mime_types
            .contains(&mime_type.trim().to_ascii_lowercase())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/format.rs"]
mod tests;
