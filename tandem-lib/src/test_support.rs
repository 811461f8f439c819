//! Scriptable in-memory stream for unit tests.

use std::sync::{Arc, Mutex};

use crate::error::StreamError;
use crate::stream::{EventSender, PlayableStream, StreamEvent};

#[derive(Debug)]
struct FakeState {
    position: f64,
    duration: Option<f64>,
    paused: bool,
    ended: bool,
    rate: f64,
    buffered: f64,
    reject_play: Option<String>,
    seeks_not_ready: bool,
    seeks: usize,
    rate_writes: usize,
    events: Option<EventSender>,
}

/// Test double that behaves like a media element: writes take effect
/// immediately and emit the matching notification.
///
/// Clones share state, so a test can keep one clone while the session owns
/// another.
#[derive(Debug, Clone)]
pub(crate) struct FakeStream {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStream {
    pub(crate) fn new(duration: f64) -> Self {
        Self::with_duration(Some(duration))
    }

    pub(crate) fn unloaded() -> Self {
        Self::with_duration(None)
    }

    fn with_duration(duration: Option<f64>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                position: 0.0,
                duration,
                paused: true,
                ended: false,
                rate: 1.0,
                buffered: 5.0,
                reject_play: None,
                seeks_not_ready: false,
                seeks: 0,
                rate_writes: 0,
                events: None,
            })),
        }
    }

    fn emit(state: &FakeState, event: StreamEvent) {
        if let Some(events) = &state.events {
            events.send(event);
        }
    }

    /// Move the clock without emitting anything, like natural playback.
    pub(crate) fn place_at(&self, position: f64) {
        self.state.lock().unwrap().position = position;
    }

    pub(crate) fn current_position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    pub(crate) fn current_rate(&self) -> f64 {
        self.state.lock().unwrap().rate
    }

    pub(crate) fn paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub(crate) fn set_buffered(&self, seconds: f64) {
        self.state.lock().unwrap().buffered = seconds;
    }

    pub(crate) fn reject_play(&self, reason: &str) {
        self.state.lock().unwrap().reject_play = Some(reason.to_string());
    }

    pub(crate) fn seeks_not_ready(&self, not_ready: bool) {
        self.state.lock().unwrap().seeks_not_ready = not_ready;
    }

    pub(crate) fn seek_count(&self) -> usize {
        self.state.lock().unwrap().seeks
    }

    pub(crate) fn rate_writes(&self) -> usize {
        self.state.lock().unwrap().rate_writes
    }

    pub(crate) fn is_subscribed(&self) -> bool {
        self.state.lock().unwrap().events.is_some()
    }

    /// Report a newly discovered duration.
    pub(crate) fn load_duration(&self, duration: f64) {
        let mut state = self.state.lock().unwrap();
        state.duration = Some(duration);
        Self::emit(&state, StreamEvent::DurationChanged { duration });
    }

    /// Run to the end of the media.
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(duration) = state.duration {
            state.position = duration;
        }
        state.ended = true;
        state.paused = true;
        Self::emit(&state, StreamEvent::Ended);
    }

    /// The host withdrew an earlier play request after the fact.
    pub(crate) fn reject_async(&self, reason: &str) {
        let mut state = self.state.lock().unwrap();
        state.paused = true;
        Self::emit(
            &state,
            StreamEvent::PlayRejected {
                reason: reason.to_string(),
            },
        );
    }

    /// Host-side pause, as if the user clicked the stream's own control.
    pub(crate) fn external_pause(&self) {
        let mut state = self.state.lock().unwrap();
        state.paused = true;
        Self::emit(&state, StreamEvent::Pause);
    }
}

impl PlayableStream for FakeStream {
    fn position(&self) -> f64 {
        self.current_position()
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().unwrap().duration
    }

    fn is_paused(&self) -> bool {
        self.paused()
    }

    fn is_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }

    fn playback_rate(&self) -> f64 {
        self.current_rate()
    }

    fn buffered_ahead(&self) -> f64 {
        self.state.lock().unwrap().buffered
    }

    fn set_position(&mut self, position: f64) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if state.seeks_not_ready {
            return Err(StreamError::NotReady);
        }
        state.position = position;
        state.seeks += 1;
        if state.duration.map_or(true, |d| position < d) {
            state.ended = false;
        }
        Self::emit(&state, StreamEvent::TimeUpdate { position });
        Ok(())
    }

    fn set_playback_rate(&mut self, rate: f64) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        state.rate_writes += 1;
        if state.rate != rate {
            state.rate = rate;
            Self::emit(&state, StreamEvent::RateChange { rate });
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), StreamError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.reject_play.clone() {
            return Err(StreamError::PlayRejected(reason));
        }
        if state.ended {
            state.ended = false;
            state.position = 0.0;
        }
        if state.paused {
            state.paused = false;
            Self::emit(&state, StreamEvent::Play);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        if !state.paused {
            state.paused = true;
            Self::emit(&state, StreamEvent::Pause);
        }
    }

    fn subscribe(&mut self, events: EventSender) {
        self.state.lock().unwrap().events = Some(events);
    }

    fn unsubscribe(&mut self) {
        self.state.lock().unwrap().events = None;
    }
}
