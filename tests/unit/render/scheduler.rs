use super::*;

#[test]
fn stepped_ticks_are_evenly_spaced() {
    let mut s = SteppedScheduler::new(60.0, 5).unwrap();
    let mut seen = Vec::new();
    let n = s
        .run(&mut |tick| {
            seen.push(tick);
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
    assert_eq!(n, 5);
    assert_eq!(seen.len(), 5);
    assert_eq!(seen[0].time_sec, 0.0);
    assert!((seen[3].time_sec - 0.05).abs() < 1e-12);
    assert_eq!(seen[4].index, 4);
}

#[test]
fn break_stops_the_loop_immediately() {
    let mut s = SteppedScheduler::new(30.0, 100).unwrap();
    let mut calls = 0;
    let n = s
        .run(&mut |tick| {
            calls += 1;
            Ok(if tick.index == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();
    assert_eq!(n, 3);
    assert_eq!(calls, 3);
}

#[test]
fn errors_propagate_out_of_the_loop() {
    let mut s = SteppedScheduler::new(30.0, 10).unwrap();
    let err = s.run(&mut |_| Err(SpectroError::render("boom")));
    assert!(err.is_err());
}

#[test]
fn slots_do_not_drift_or_replay() {
    let period = Duration::from_millis(10);
    // On time: next slot.
    assert_eq!(next_slot(0, Duration::from_millis(3), period), 1);
    // Overran two periods: skip to the first future deadline.
    assert_eq!(next_slot(1, Duration::from_millis(35), period), 4);
    // Exactly on a boundary counts as passed.
    assert_eq!(next_slot(4, Duration::from_millis(40), period), 5);
}

#[test]
fn paced_scheduler_respects_the_refresh_period() {
    let mut s = PacedScheduler::new(200.0).unwrap();
    assert_eq!(s.period(), Duration::from_millis(5));
    let start = Instant::now();
    let mut last = -1.0;
    let n = s
        .run(&mut |tick| {
            assert!(tick.time_sec > last);
            last = tick.time_sec;
            Ok(if tick.index == 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();
    assert_eq!(n, 5);
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn rejects_non_positive_rates() {
    assert!(PacedScheduler::new(0.0).is_err());
    assert!(SteppedScheduler::new(-1.0, 1).is_err());
}
