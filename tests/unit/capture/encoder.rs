use super::*;

fn frame(fill: u8) -> FrameRGBA {
    FrameRGBA {
        width: 1,
        height: 1,
        data: vec![fill; 4],
        premultiplied: true,
    }
}

#[test]
fn frames_before_start_are_rejected() {
    let mut enc = InMemoryEncoder::new("video/webm");
    assert!(enc.push_frame(&frame(1)).is_err());
}

#[test]
fn events_arrive_in_order_and_end_with_stopped() {
    let mut enc = InMemoryEncoder::new("video/webm");
    enc.start().unwrap();
    enc.push_frame(&frame(1)).unwrap();
    enc.push_frame(&frame(2)).unwrap();
    enc.request_stop().unwrap();
    enc.request_stop().unwrap();

    assert_eq!(enc.try_event(), Some(EncoderEvent::Data(vec![1; 4])));
    assert_eq!(enc.try_event(), Some(EncoderEvent::Data(vec![2; 4])));
    assert_eq!(enc.try_event(), Some(EncoderEvent::Stopped(Ok(()))));
    assert_eq!(enc.try_event(), None);
    assert!(enc.push_frame(&frame(3)).is_err());
    assert_eq!(enc.frames_pushed(), 2);
}
