use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic time source for playback.
pub trait Clock: Send {
    fn now(&self) -> Duration;
}

/// Wall clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock for deterministic playback (offline export, tests). Clones share time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    poison_reported: Arc<AtomicBool>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now = now.saturating_add(by);
    }

    pub fn set(&self, to: Duration) {
        *self.lock() = to;
    }

    // A `Duration` cannot be left half-written, so a poisoned lock still holds a valid time.
    fn lock(&self) -> MutexGuard<'_, Duration> {
        self.now.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            if !self.poison_reported.swap(true, Ordering::Relaxed) {
                tracing::warn!("manual clock lock was poisoned by a panicking holder; continuing");
            }
            poisoned.into_inner()
        })
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.lock()
    }
}

/// Handle returned by [`AudioTransport::subscribe_ended`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndedSubscription(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// Playback reached the end of the media; delivered once per playthrough to each subscriber.
    Ended(EndedSubscription),
}

/// Playback control surface the visualizer and the recorder drive.
pub trait AudioTransport {
    fn play(&mut self);
    fn pause(&mut self);
    /// Move the playhead; clamped to `[0, duration]`.
    fn seek(&mut self, sec: f64);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn is_playing(&self) -> bool;

    fn subscribe_ended(&mut self) -> EndedSubscription;
    fn unsubscribe_ended(&mut self, sub: EndedSubscription);

    /// Advance transport state and drain pending events.
    fn poll_events(&mut self) -> Vec<TransportEvent>;
}

/// A transport with no sound device: position follows a [`Clock`] while playing.
#[derive(Debug)]
pub struct PlaybackClock<C: Clock> {
    clock: C,
    duration_sec: f64,
    position_sec: f64,
    playing_since: Option<Duration>,
    subscribers: Vec<EndedSubscription>,
    next_subscription: u64,
}

impl<C: Clock> PlaybackClock<C> {
    pub fn new(clock: C, duration_sec: f64) -> Self {
        Self {
            clock,
            duration_sec: duration_sec.max(0.0),
            position_sec: 0.0,
            playing_since: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn elapsed_since(&self, anchor: Duration) -> f64 {
        self.clock.now().saturating_sub(anchor).as_secs_f64()
    }
}

impl<C: Clock> AudioTransport for PlaybackClock<C> {
    fn play(&mut self) {
        if self.playing_since.is_some() {
            return;
        }
        if self.position_sec >= self.duration_sec {
            self.position_sec = 0.0;
        }
        self.playing_since = Some(self.clock.now());
    }

    fn pause(&mut self) {
        self.position_sec = self.current_time();
        self.playing_since = None;
    }

    fn seek(&mut self, sec: f64) {
        let sec = if sec.is_finite() { sec } else { 0.0 };
        self.position_sec = sec.clamp(0.0, self.duration_sec);
        if self.playing_since.is_some() {
            self.playing_since = Some(self.clock.now());
        }
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(anchor) => (self.position_sec + self.elapsed_since(anchor)).min(self.duration_sec),
            None => self.position_sec,
        }
    }

    fn duration(&self) -> f64 {
        self.duration_sec
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    fn subscribe_ended(&mut self) -> EndedSubscription {
        let sub = EndedSubscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(sub);
        sub
    }

    fn unsubscribe_ended(&mut self, sub: EndedSubscription) {
        self.subscribers.retain(|s| *s != sub);
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        if self.playing_since.is_none() || self.current_time() < self.duration_sec {
            return Vec::new();
        }
        self.position_sec = self.duration_sec;
        self.playing_since = None;
        tracing::debug!(subscribers = self.subscribers.len(), "playback ended");
        self.subscribers
            .iter()
            .copied()
            .map(TransportEvent::Ended)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/transport.rs"]
mod tests;
