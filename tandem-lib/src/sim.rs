//! Simulated media stream stepped in virtual time.
//!
//! Each stream runs its own clock with a small skew, so a group of them
//! drifts apart the way independently decoded media elements do. Seeking
//! drops the read-ahead buffer, which refills while time passes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;

use crate::error::StreamError;
use crate::stream::{EventSender, PlayableStream, StreamEvent};
use crate::tools::timer::Timer;

/// Seconds of media buffered per second of wall time.
const FILL_RATE: f64 = 4.0;
/// Read-ahead ceiling in seconds.
const MAX_BUFFER: f64 = 10.0;

#[derive(Debug)]
struct SimState {
    clock: Timer,
    duration: Option<f64>,
    skew: f64,
    ended: bool,
    buffered: f64,
    reject_play: Option<String>,
    events: Option<EventSender>,
}

impl SimState {
    fn emit(&self, event: StreamEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }

    fn position(&self) -> f64 {
        self.clock.get_time().as_secs_f64()
    }
}

/// A media-element-like stream driven by [`advance`](SimulatedStream::advance).
///
/// Clones share state: the session owns one clone and the driver keeps another
/// to move time forward.
#[derive(Debug, Clone)]
pub struct SimulatedStream {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedStream {
    /// A stream of `duration` seconds whose clock runs exactly on time.
    pub fn new(duration: f64) -> Self {
        Self::build(Some(duration))
    }

    /// A stream whose duration is not known until [`load_duration`](Self::load_duration).
    pub fn unloaded() -> Self {
        Self::build(None)
    }

    fn build(duration: Option<f64>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                clock: Timer::new(),
                duration,
                skew: 1.0,
                ended: false,
                buffered: MAX_BUFFER,
                reject_play: None,
                events: None,
            })),
        }
    }

    /// Clock error as a ratio, e.g. `1.002` runs 0.2% fast.
    pub fn with_skew(self, skew: f64) -> Self {
        if skew.is_finite() && skew > 0.0 {
            self.state().skew = skew;
        }
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refuse future play requests with `reason`; `None` accepts them again.
    pub fn set_reject_play(&self, reason: Option<&str>) {
        self.state().reject_play = reason.map(str::to_string);
    }

    /// Metadata arrived late.
    pub fn load_duration(&self, duration: f64) {
        let mut state = self.state();
        state.duration = Some(duration);
        state.emit(StreamEvent::MetadataLoaded { duration });
    }

    /// Step the stream forward by `elapsed` wall time.
    ///
    /// Playback consumes the buffer at the media rate while it refills at a
    /// fixed speed. Reaching the end pauses the clock and emits `Ended`.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.state();
        let wall = elapsed.as_secs_f64();
        let skew = state.skew;
        let gained = state.clock.advance(elapsed.mul_f64(skew)).as_secs_f64();
        state.buffered = (state.buffered + wall * FILL_RATE - gained).clamp(0.0, MAX_BUFFER);

        if let Some(duration) = state.duration {
            if state.clock.is_running() && state.position() >= duration {
                state.clock.set_time(Duration::from_secs_f64(duration));
                state.clock.pause();
                state.ended = true;
                debug!("Simulated stream reached end at {:.3}s", duration);
                state.emit(StreamEvent::Ended);
            }
        }
    }
}

impl PlayableStream for SimulatedStream {
    fn position(&self) -> f64 {
        self.state().position()
    }

    fn duration(&self) -> Option<f64> {
        self.state().duration
    }

    fn is_paused(&self) -> bool {
        !self.state().clock.is_running()
    }

    fn is_ended(&self) -> bool {
        self.state().ended
    }

    fn playback_rate(&self) -> f64 {
        self.state().clock.rate()
    }

    fn buffered_ahead(&self) -> f64 {
        self.state().buffered
    }

    fn set_position(&mut self, position: f64) -> Result<(), StreamError> {
        if !position.is_finite() || position < 0.0 {
            return Err(StreamError::Unavailable(format!(
                "cannot seek to {position}"
            )));
        }
        let mut state = self.state();
        let target = match state.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        state.clock.set_time(Duration::from_secs_f64(target));
        state.buffered = 0.0;
        state.ended = state.duration.map_or(false, |duration| target >= duration);
        state.emit(StreamEvent::TimeUpdate { position: target });
        Ok(())
    }

    fn set_playback_rate(&mut self, rate: f64) -> Result<(), StreamError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(StreamError::Unavailable(format!("unsupported rate {rate}")));
        }
        let mut state = self.state();
        if state.clock.rate() != rate {
            state.clock.set_rate(rate);
            state.emit(StreamEvent::RateChange { rate });
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), StreamError> {
        let mut state = self.state();
        if let Some(reason) = state.reject_play.clone() {
            return Err(StreamError::PlayRejected(reason));
        }
        if state.ended {
            // Playing an ended stream restarts it from the top.
            state.ended = false;
            state.clock.start_at(Duration::ZERO);
            state.emit(StreamEvent::Play);
            return Ok(());
        }
        if !state.clock.is_running() {
            state.clock.start();
            state.emit(StreamEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state();
        if state.clock.is_running() {
            state.clock.pause();
            state.emit(StreamEvent::Pause);
        }
    }

    fn subscribe(&mut self, events: EventSender) {
        let mut state = self.state();
        if let Some(duration) = state.duration {
            events.send(StreamEvent::MetadataLoaded { duration });
        }
        state.events = Some(events);
    }

    fn unsubscribe(&mut self) {
        self.state().events = None;
    }
}
