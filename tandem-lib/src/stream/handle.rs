//! Cached view of a registered stream plus the capability that backs it.

use std::fmt;

use crate::error::StreamError;

use super::{EventSender, PlayableStream, StreamId};

/// Playback state as last observed on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Paused,
    Playing,
    Ended,
}

/// A registered stream.
///
/// The cached fields are refreshed from the capability on every tick and by
/// the stream's own notifications. Writes go straight to the capability and
/// update the cache on success.
pub struct StreamHandle {
    id: StreamId,
    stream: Box<dyn PlayableStream>,
    duration: f64,
    position: f64,
    state: PlaybackState,
    rate: f64,
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("duration", &self.duration)
            .field("position", &self.position)
            .field("state", &self.state)
            .field("rate", &self.rate)
            .finish()
    }
}

impl StreamHandle {
    pub fn new(id: StreamId, stream: Box<dyn PlayableStream>) -> Self {
        let mut handle = Self {
            id,
            stream,
            duration: 0.0,
            position: 0.0,
            state: PlaybackState::Paused,
            rate: 1.0,
        };
        handle.refresh();
        handle.duration = normalize_duration(handle.stream.duration());
        handle
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Last known duration in seconds, 0 while unknown.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_ended(&self) -> bool {
        self.state == PlaybackState::Ended
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn buffered_ahead(&self) -> f64 {
        self.stream.buffered_ahead()
    }

    /// Re-read position, state and rate from the capability.
    ///
    /// Non-finite readings keep the previous value.
    pub fn refresh(&mut self) {
        self.note_position(self.stream.position());
        self.note_rate(self.stream.playback_rate());
        self.state = if self.stream.is_ended() {
            PlaybackState::Ended
        } else if self.stream.is_paused() {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
    }

    /// Store a newly reported duration. Returns true if it changed.
    pub fn set_duration(&mut self, duration: f64) -> bool {
        let duration = normalize_duration(Some(duration));
        if duration == self.duration {
            return false;
        }
        self.duration = duration;
        true
    }

    pub(crate) fn note_position(&mut self, position: f64) {
        if position.is_finite() {
            self.position = position;
        }
    }

    pub(crate) fn note_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    pub(crate) fn note_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.rate = rate;
        }
    }

    pub fn seek(&mut self, position: f64) -> Result<(), StreamError> {
        self.stream.set_position(position)?;
        self.position = position;
        if self.state == PlaybackState::Ended && position < self.duration {
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<(), StreamError> {
        self.stream.set_playback_rate(rate)?;
        self.rate = rate;
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), StreamError> {
        self.stream.play()?;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.stream.pause();
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub(crate) fn subscribe(&mut self, events: EventSender) {
        self.stream.subscribe(events);
    }

    pub(crate) fn unsubscribe(&mut self) {
        self.stream.unsubscribe();
    }
}

/// Unknown, non-finite and negative durations all collapse to 0.
pub(crate) fn normalize_duration(duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => 0.0,
    }
}
