//! Frame pacing for the render loop.
//!
//! A scheduler invokes one frame callback at a time; a frame never starts before the previous
//! one has returned.

use crate::foundation::error::{SpectroError, SpectroResult};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

/// One scheduled frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Count of frames delivered so far.
    pub index: u64,
    /// Seconds since the scheduler started.
    pub time_sec: f64,
}

pub type FrameCallback<'a> = dyn FnMut(FrameTick) -> SpectroResult<ControlFlow<()>> + 'a;

pub trait FrameScheduler {
    /// Drive `frame` until it breaks or errors; returns the number of frames delivered.
    fn run(&mut self, frame: &mut FrameCallback<'_>) -> SpectroResult<u64>;
}

/// Wall-clock pacing at a fixed refresh rate.
///
/// Deadlines are `start + n * period`, so lateness in one frame does not accumulate. When a frame
/// overruns by whole periods those slots are dropped rather than replayed.
#[derive(Debug, Clone)]
pub struct PacedScheduler {
    period: Duration,
}

impl PacedScheduler {
    pub fn new(refresh_hz: f64) -> SpectroResult<Self> {
        if !refresh_hz.is_finite() || refresh_hz <= 0.0 {
            return Err(SpectroError::validation(format!(
                "refresh rate must be positive, got {refresh_hz}"
            )));
        }
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / refresh_hz),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameScheduler for PacedScheduler {
    fn run(&mut self, frame: &mut FrameCallback<'_>) -> SpectroResult<u64> {
        let start = Instant::now();
        let mut slot: u64 = 0;
        let mut delivered: u64 = 0;
        loop {
            let tick = FrameTick {
                index: delivered,
                time_sec: start.elapsed().as_secs_f64(),
            };
            delivered += 1;
            if frame(tick)?.is_break() {
                return Ok(delivered);
            }

            slot = next_slot(slot, start.elapsed(), self.period);
            let slot_u32 = u32::try_from(slot).unwrap_or(u32::MAX);
            let deadline = start + self.period.saturating_mul(slot_u32);
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }
    }
}

/// First slot after `current` whose deadline has not yet passed at `elapsed`.
pub(crate) fn next_slot(current: u64, elapsed: Duration, period: Duration) -> u64 {
    let period_ns = period.as_nanos().max(1);
    let passed = (elapsed.as_nanos() / period_ns) as u64;
    (current + 1).max(passed + 1)
}

/// Deterministic ticks at `1 / fps` spacing without sleeping.
#[derive(Debug, Clone)]
pub struct SteppedScheduler {
    fps: f64,
    max_frames: u64,
}

impl SteppedScheduler {
    pub fn new(fps: f64, max_frames: u64) -> SpectroResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(SpectroError::validation(format!(
                "fps must be positive, got {fps}"
            )));
        }
        Ok(Self { fps, max_frames })
    }
}

impl FrameScheduler for SteppedScheduler {
    fn run(&mut self, frame: &mut FrameCallback<'_>) -> SpectroResult<u64> {
        for index in 0..self.max_frames {
            let tick = FrameTick {
                index,
                time_sec: index as f64 / self.fps,
            };
            if frame(tick)?.is_break() {
                return Ok(index + 1);
            }
        }
        Ok(self.max_frames)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
