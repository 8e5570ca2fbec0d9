use super::*;

const ENCODERS: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
 S..... srt                  SubRip subtitle
";

const MUXERS: &str = "File formats:
 D. = Demuxing supported
 .E = Muxing supported
 --
  E mp4             MP4 (MPEG-4 Part 14)
  E webm            WebM
 D  matroska,webm   Matroska / WebM
";

#[test]
fn listings_are_parsed_by_kind() {
    let caps = FfmpegCapabilities::from_listings(ENCODERS, MUXERS);
    assert!(caps.has_encoder("libx264"));
    assert!(caps.has_encoder("aac"));
    assert!(!caps.has_encoder("srt"));
    assert!(caps.has_muxer("mp4"));
    assert!(caps.has_muxer("webm"));
    assert!(!caps.has_muxer("matroska"));
    assert!(!caps.has_encoder("Encoders:"));
}

#[test]
fn support_requires_muxer_and_both_codecs() {
    let caps = FfmpegCapabilities::from_listings(ENCODERS, MUXERS);
    assert!(caps.is_type_supported("video/mp4;codecs=h264"));
    // matroska muxer missing
    assert!(!caps.is_type_supported("video/webm;codecs=h264"));
    // libopus missing
    assert!(!caps.is_type_supported("video/webm;codecs=vp9"));
    assert!(caps.is_type_supported("video/webm"));
    assert!(!caps.is_type_supported("video/ogg"));
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_half_alpha_mixes_with_bg() {
    let src = vec![100u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [0, 0, 200, 255]).unwrap();
    assert_eq!(dst, vec![100, 0, 100, 255]);
}

#[test]
fn odd_capture_size_is_rejected_before_spawning() {
    let stream = CaptureStream::new(crate::foundation::core::Viewport::new(3, 2).unwrap(), None);
    let err = FfmpegEncoder::new(&stream, BASELINE).err().unwrap();
    assert!(err.to_string().contains("even"));
}

#[test]
fn missing_audio_source_is_rejected() {
    let stream = CaptureStream::new(
        crate::foundation::core::Viewport::new(4, 4).unwrap(),
        Some("no/such/audio.wav".into()),
    );
    assert!(FfmpegEncoder::new(&stream, BASELINE).is_err());
}
