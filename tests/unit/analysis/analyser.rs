use super::*;

fn opts(fft_size: usize) -> AnalyserOpts {
    AnalyserOpts {
        fft_size,
        smoothing_time_constant: 0.8,
        min_decibels: -90.0,
        max_decibels: -10.0,
    }
}

fn tone(freq_hz: f32, sample_rate: u32, seconds: f32) -> Arc<[f32]> {
    let len = (sample_rate as f32 * seconds) as usize;
    (0..len)
        .map(|i| {
            let t = i as f64 / f64::from(sample_rate);
            (2.0 * std::f64::consts::PI * f64::from(freq_hz) * t).sin() as f32
        })
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn silence_produces_zero_bins() {
    let pcm: Arc<[f32]> = vec![0.0; 48_000].into();
    let mut a = PcmAnalyser::new(pcm, 48_000, opts(1024)).unwrap();
    a.set_playhead(Some(0.5));
    let mut out = vec![7u8; a.bin_count()];
    a.byte_frequency_data(&mut out);
    assert_eq!(a.bin_count(), 512);
    assert!(out.iter().all(|&b| b == 0));
}

#[test]
fn pure_tone_peaks_at_its_bin() {
    let sample_rate = 48_000;
    let fft_size = 1024;
    let bin = 32usize;
    let freq = bin as f32 * sample_rate as f32 / fft_size as f32;
    let mut a =
        PcmAnalyser::new(tone(freq, sample_rate, 1.0), sample_rate, opts(fft_size)).unwrap();
    a.set_playhead(Some(0.5));

    let mut out = vec![0u8; a.bin_count()];
    a.byte_frequency_data(&mut out);
    let (peak, &value) = out
        .iter()
        .enumerate()
        .max_by_key(|&(_, v)| *v)
        .unwrap();
    assert_eq!(peak, bin);
    assert!(value > 150, "peak byte {value}");
    assert_eq!(out[400], 0);
}

#[test]
fn pausing_decays_toward_silence() {
    let sample_rate = 48_000;
    let mut a = PcmAnalyser::new(tone(1500.0, sample_rate, 1.0), sample_rate, opts(1024)).unwrap();
    let mut out = vec![0u8; a.bin_count()];
    a.set_playhead(Some(0.5));
    for _ in 0..5 {
        a.byte_frequency_data(&mut out);
    }
    let loud: u32 = out.iter().map(|&b| u32::from(b)).sum();

    a.set_playhead(None);
    a.byte_frequency_data(&mut out);
    let after_one: u32 = out.iter().map(|&b| u32::from(b)).sum();
    for _ in 0..200 {
        a.byte_frequency_data(&mut out);
    }
    let settled: u32 = out.iter().map(|&b| u32::from(b)).sum();
    assert!(after_one < loud);
    assert_eq!(settled, 0);
}

#[test]
fn playhead_before_enough_history_zero_pads() {
    let sample_rate = 48_000;
    let mut a = PcmAnalyser::new(tone(440.0, sample_rate, 0.1), sample_rate, opts(2048)).unwrap();
    a.set_playhead(Some(0.001));
    let mut out = vec![0u8; a.bin_count()];
    a.byte_frequency_data(&mut out);
    assert_eq!(out.len(), 1024);

    // Past the end the window clamps to the tail of the buffer.
    a.set_playhead(Some(10.0));
    a.byte_frequency_data(&mut out);
    assert!(out.iter().any(|&b| b > 0));
}

#[test]
fn rejects_invalid_options() {
    let pcm: Arc<[f32]> = vec![0.0; 16].into();
    assert!(PcmAnalyser::new(pcm.clone(), 48_000, opts(1000)).is_err());
    assert!(PcmAnalyser::new(pcm.clone(), 0, opts(1024)).is_err());
    let mut bad = opts(1024);
    bad.min_decibels = 0.0;
    assert!(PcmAnalyser::new(pcm, 48_000, bad).is_err());
}

#[test]
fn blackman_is_zero_at_frame_start_and_one_at_center() {
    assert!(blackman_window(0, 1024).abs() < 1e-6);
    assert!((blackman_window(512, 1024) - 1.0).abs() < 1e-6);
}

#[test]
fn byte_mapping_clamps_to_decibel_window() {
    assert_eq!(magnitude_to_byte(0.0, -90.0, 80.0), 0);
    assert_eq!(magnitude_to_byte(1.0, -90.0, 80.0), 255);
    // -50 dB sits halfway between -90 and -10.
    let half = magnitude_to_byte(10f32.powf(-50.0 / 20.0), -90.0, 80.0);
    assert!((126..=128).contains(&half));
}
