use super::*;
use crate::analysis::spectrum::StaticSpectrum;
use crate::foundation::core::{BezPath, Viewport};

#[derive(Default)]
struct CountingSurface {
    viewport: Option<Viewport>,
    clears: usize,
    fills: Vec<[u8; 4]>,
    pixels: Vec<u8>,
}

impl CountingSurface {
    fn new(w: u32, h: u32) -> Self {
        Self {
            viewport: Some(Viewport::new(w, h).unwrap()),
            ..Self::default()
        }
    }
}

impl DrawSurface for CountingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport.unwrap()
    }

    fn resize(&mut self, viewport: Viewport) -> SpectroResult<()> {
        self.viewport = Some(viewport);
        Ok(())
    }

    fn clear(&mut self) -> SpectroResult<()> {
        self.clears += 1;
        Ok(())
    }

    fn fill_path(&mut self, _path: &BezPath, rgba: [u8; 4]) -> SpectroResult<()> {
        self.fills.push(rgba);
        Ok(())
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn loud_spectrum() -> StaticSpectrum {
    StaticSpectrum {
        sample_rate: 48_000,
        bins: vec![255; 512],
    }
}

#[test]
fn silent_spectrum_draws_nothing_but_still_clears() {
    let mut v = Visualizer::new(Arc::new(VisualizerConfig::default())).unwrap();
    let mut src = StaticSpectrum {
        sample_rate: 48_000,
        bins: vec![0; 512],
    };
    let mut surface = CountingSurface::new(640, 360);
    assert_eq!(v.state(), LoopState::Idle);
    for i in 0..10 {
        let report = v.render_frame(&mut src, &mut surface, i as f64 / 60.0).unwrap();
        assert_eq!(report.bands_drawn, 0);
    }
    assert_eq!(v.state(), LoopState::Running);
    assert_eq!(surface.clears, 10);
    assert!(surface.fills.is_empty());
}

#[test]
fn loud_spectrum_draws_every_band_in_order() {
    let cfg = VisualizerConfig::default();
    let colors: Vec<_> = cfg.waves.iter().map(|b| b.color.to_rgba8_straight()).collect();
    let mut v = Visualizer::new(Arc::new(cfg)).unwrap();
    let mut surface = CountingSurface::new(640, 360);
    let report = v.render_frame(&mut loud_spectrum(), &mut surface, 0.5).unwrap();
    assert_eq!(report.bands_drawn, 5);
    assert_eq!(surface.fills, colors);
    for a in &report.amplitudes {
        assert!((a - 0.29).abs() < 1e-12);
    }
}

#[test]
fn draw_is_skipped_below_the_silence_threshold() {
    // One byte of energy in the bass band: amplitude 0.29/255 * 0.8 * 90 * intensity.
    let mut bins = vec![0u8; 512];
    for b in &mut bins[0..=2] {
        *b = 1;
    }
    let mut src = StaticSpectrum {
        sample_rate: 48_000,
        bins,
    };
    let mut v = Visualizer::new(Arc::new(VisualizerConfig::default())).unwrap();
    v.set_intensity(0.001).unwrap();
    let mut surface = CountingSurface::new(640, 360);
    let report = v.render_frame(&mut src, &mut surface, 0.0).unwrap();
    assert!(report.amplitudes[0] > 0.0);
    assert_eq!(report.bands_drawn, 0);
    assert!(surface.fills.is_empty());

    v.set_intensity(3.0).unwrap();
    let report = v.render_frame(&mut src, &mut surface, 0.0).unwrap();
    assert_eq!(report.bands_drawn, 1);
}

#[test]
fn resizing_keeps_smoothing_state() {
    let mut v = Visualizer::new(Arc::new(VisualizerConfig::default())).unwrap();
    let mut surface = CountingSurface::new(640, 360);
    let mut src = loud_spectrum();
    v.render_frame(&mut src, &mut surface, 0.0).unwrap();
    let before = v.amplitudes().to_vec();
    surface.resize(Viewport::new(1920, 1080).unwrap()).unwrap();
    let report = v.render_frame(&mut src, &mut surface, 1.0 / 60.0).unwrap();
    for (b, a) in before.iter().zip(&report.amplitudes) {
        assert!(a > b);
    }
}

#[test]
fn recolor_applies_from_the_next_frame() {
    let mut v = Visualizer::new(Arc::new(VisualizerConfig::default())).unwrap();
    let mut surface = CountingSurface::new(320, 200);
    let mut src = loud_spectrum();
    let old = Arc::clone(v.config());
    v.set_band_color(0, BandColor::from_picker_hex("#ffffff").unwrap())
        .unwrap();
    v.render_frame(&mut src, &mut surface, 0.0).unwrap();
    assert_eq!(surface.fills[0], [255, 255, 255, 128]);
    // The previous snapshot is untouched.
    assert_eq!(old.waves[0].color.to_hex_rgb(), "#00a896");
}

#[test]
fn publish_rejects_shape_changes() {
    let mut v = Visualizer::new(Arc::new(VisualizerConfig::default())).unwrap();
    let mut cfg = VisualizerConfig::default();
    cfg.waves.pop();
    assert!(v.publish_config(Arc::new(cfg)).is_err());
    assert!(v.set_intensity(-1.0).is_err());
}
