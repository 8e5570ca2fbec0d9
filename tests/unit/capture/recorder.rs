use super::*;
use crate::audio::transport::{ManualClock, PlaybackClock};
use crate::capture::encoder::InMemoryEncoder;
use crate::capture::format::{FormatDescriptor, StaticSupport};
use crate::foundation::core::Viewport;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Notices(Arc<Mutex<Vec<String>>>);

impl Notifier for Notices {
    fn notify(&mut self, message: &str) {
        self.0.lock().unwrap().push(message.to_owned());
    }
}

#[derive(Clone, Default)]
struct Downloads(Arc<Mutex<Vec<(String, Blob)>>>);

impl DownloadTarget for Downloads {
    fn deliver(&mut self, file_name: &str, blob: &Blob) -> SpectroResult<PathBuf> {
        self.0
            .lock()
            .unwrap()
            .push((file_name.to_owned(), blob.clone()));
        Ok(PathBuf::from("downloads").join(file_name))
    }
}

#[derive(Clone, Default)]
struct Factory {
    fail_preferred: bool,
    fail_baseline: bool,
    requests: Arc<Mutex<Vec<Option<&'static str>>>>,
}

impl EncoderFactory for Factory {
    fn create(
        &self,
        _stream: &CaptureStream,
        format: Option<&FormatDescriptor>,
    ) -> SpectroResult<Box<dyn MediaEncoder>> {
        self.requests
            .lock()
            .unwrap()
            .push(format.map(|f| f.mime_type));
        let fail = if format.is_some() {
            self.fail_preferred
        } else {
            self.fail_baseline
        };
        if fail {
            return Err(SpectroError::unsupported("no such encoder"));
        }
        let mime = format.map_or(BASELINE.mime_type, |f| f.mime_type);
        Ok(Box::new(InMemoryEncoder::new(mime)))
    }
}

struct Harness {
    recorder: Recorder,
    notices: Notices,
    downloads: Downloads,
    factory: Factory,
    clock: ManualClock,
    transport: PlaybackClock<ManualClock>,
}

fn harness(support: StaticSupport, factory: Factory) -> Harness {
    let notices = Notices::default();
    let downloads = Downloads::default();
    let clock = ManualClock::new();
    Harness {
        recorder: Recorder::new(support, factory.clone(), notices.clone(), downloads.clone()),
        notices,
        downloads,
        factory,
        transport: PlaybackClock::new(clock.clone(), 2.0),
        clock,
    }
}

fn stream() -> CaptureStream {
    CaptureStream::new(Viewport::new(2, 2).unwrap(), None)
}

fn frame(fill: u8) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 2,
        data: vec![fill; 16],
        premultiplied: true,
    }
}

#[test]
fn export_rewinds_subscribes_and_plays() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    h.transport.play();
    h.clock.advance(Duration::from_millis(700));

    h.recorder.export(stream(), &mut h.transport).unwrap();

    assert_eq!(h.recorder.state(), CaptureState::Recording);
    let session = h.recorder.session().unwrap();
    assert_eq!(session.mime_type(), "video/mp4;codecs=h264");
    assert_eq!(session.file_extension(), "mp4");
    assert!(session.is_recording());
    assert!(h.transport.is_playing());
    assert_eq!(h.transport.current_time(), 0.0);
    assert_eq!(h.transport.subscriber_count(), 1);
}

#[test]
fn export_while_recording_is_a_no_op() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    h.recorder.export(stream(), &mut h.transport).unwrap();
    h.recorder.export(stream(), &mut h.transport).unwrap();

    assert_eq!(h.factory.requests.lock().unwrap().len(), 1);
    assert_eq!(h.transport.subscriber_count(), 1);
}

#[test]
fn only_the_generic_container_supported_selects_it() {
    let mut h = harness(StaticSupport::new(["video/webm"]), Factory::default());
    h.recorder.export(stream(), &mut h.transport).unwrap();
    let session = h.recorder.session().unwrap();
    assert_eq!(session.mime_type(), "video/webm");
    assert_eq!(session.file_extension(), "webm");
    assert!(h.notices.0.lock().unwrap().is_empty());
}

#[test]
fn construction_failure_falls_back_with_a_single_notice() {
    let factory = Factory {
        fail_preferred: true,
        ..Factory::default()
    };
    let mut h = harness(StaticSupport::all(), factory);
    h.recorder.export(stream(), &mut h.transport).unwrap();

    assert_eq!(*h.notices.0.lock().unwrap(), vec![FALLBACK_NOTICE.to_owned()]);
    assert_eq!(
        *h.factory.requests.lock().unwrap(),
        vec![Some("video/mp4;codecs=h264"), None]
    );
    let session = h.recorder.session().unwrap();
    assert_eq!(session.mime_type(), "video/webm");
    assert_eq!(session.file_extension(), "webm");
}

#[test]
fn fallback_failure_is_fatal_and_leaves_nothing_active() {
    let factory = Factory {
        fail_preferred: true,
        fail_baseline: true,
        ..Factory::default()
    };
    let mut h = harness(StaticSupport::all(), factory);
    let err = h.recorder.export(stream(), &mut h.transport).unwrap_err();

    assert!(matches!(err, SpectroError::Capture(_)));
    let notices = h.notices.0.lock().unwrap().clone();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0], FALLBACK_NOTICE);
    assert!(notices[1].contains("could not be started"));
    assert!(h.recorder.session().is_none());
    assert_eq!(h.recorder.state(), CaptureState::Idle);
    assert!(!h.transport.is_playing());
    assert_eq!(h.transport.subscriber_count(), 0);
}

#[test]
fn manual_stop_finalizes_and_delivers_concatenated_chunks() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    h.recorder.export(stream(), &mut h.transport).unwrap();

    assert_eq!(h.recorder.capture_frame(&frame(1), 10.0).unwrap(), 1);
    assert_eq!(h.recorder.pump(&mut h.transport).unwrap(), None);
    assert_eq!(h.recorder.session().unwrap().chunks().len(), 1);
    assert_eq!(h.recorder.capture_frame(&frame(2), 10.0 + 1.0 / 60.0).unwrap(), 1);

    h.recorder.stop().unwrap();
    assert_eq!(h.recorder.state(), CaptureState::Finalizing);
    assert_eq!(h.recorder.capture_frame(&frame(3), 11.0).unwrap(), 0);

    let outcome = h.recorder.pump(&mut h.transport).unwrap().unwrap();
    assert_eq!(outcome.mime_type, "video/mp4;codecs=h264");
    assert_eq!(outcome.bytes, 32);
    assert!(outcome.file_name.starts_with("spectroflow-export-"));
    assert!(outcome.file_name.ends_with(".mp4"));
    assert_eq!(outcome.encoder_error, None);

    let delivered = h.downloads.0.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    let mut expected = vec![1u8; 16];
    expected.extend_from_slice(&[2u8; 16]);
    assert_eq!(delivered[0].1.bytes, expected);

    assert!(h.recorder.session().is_none());
    assert_eq!(h.recorder.state(), CaptureState::Idle);
    assert_eq!(h.transport.subscriber_count(), 0);
    assert_eq!(h.recorder.pump(&mut h.transport).unwrap(), None);
}

#[test]
fn audio_end_stops_the_recording() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    h.recorder.export(stream(), &mut h.transport).unwrap();
    h.recorder.capture_frame(&frame(9), 0.0).unwrap();

    h.clock.advance(Duration::from_secs(3));
    for event in h.transport.poll_events() {
        h.recorder.handle_transport_event(event).unwrap();
    }
    let outcome = h.recorder.pump(&mut h.transport).unwrap().unwrap();
    assert_eq!(outcome.bytes, 16);
    assert!(!h.recorder.is_recording());
}

#[test]
fn stop_is_idempotent_and_a_no_op_when_idle() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    h.recorder.stop().unwrap();
    assert_eq!(h.recorder.state(), CaptureState::Idle);

    h.recorder.export(stream(), &mut h.transport).unwrap();
    h.recorder.stop().unwrap();
    h.recorder.stop().unwrap();
    assert!(h.recorder.pump(&mut h.transport).unwrap().is_some());
    assert_eq!(h.downloads.0.lock().unwrap().len(), 1);
}

#[test]
fn slow_frames_are_duplicated_to_hold_the_capture_rate() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    h.recorder.export(stream(), &mut h.transport).unwrap();
    assert_eq!(h.recorder.capture_frame(&frame(1), 0.0).unwrap(), 1);
    assert_eq!(h.recorder.capture_frame(&frame(1), 0.05).unwrap(), 3);
    assert_eq!(h.recorder.session().unwrap().frames_captured(), 4);
}

#[test]
fn events_for_other_subscriptions_are_ignored() {
    let mut h = harness(StaticSupport::all(), Factory::default());
    let foreign = h.transport.subscribe_ended();
    h.recorder.export(stream(), &mut h.transport).unwrap();
    h.recorder
        .handle_transport_event(TransportEvent::Ended(foreign))
        .unwrap();
    assert_eq!(h.recorder.state(), CaptureState::Recording);
}
