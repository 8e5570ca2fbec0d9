use super::*;

#[test]
fn f32le_bytes_decode_in_order() {
    let mut bytes = Vec::new();
    for v in [0.0f32, -1.0, 0.5] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(pcm_from_f32le(&bytes).unwrap(), vec![0.0, -1.0, 0.5]);
}

#[test]
fn misaligned_pcm_is_rejected() {
    assert!(pcm_from_f32le(&[0, 0, 0]).is_err());
}

#[test]
fn missing_file_is_an_analysis_error() {
    let err = decode_audio_mono(Path::new("definitely/not/here.wav"), 48_000).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn duration_follows_sample_count() {
    let audio = DecodedAudio {
        source_path: PathBuf::from("x.wav"),
        sample_rate: 48_000,
        samples: vec![0.0; 24_000].into(),
    };
    assert!((audio.duration_sec() - 0.5).abs() < 1e-12);
}
