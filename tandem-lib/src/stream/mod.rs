//! The playable-stream capability the session drives.
//!
//! Loading, decoding and rendering live outside this crate. The session only
//! needs to read a stream's clock, write its position and rate, start and
//! stop it, and hear about its state transitions.

pub mod handle;

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::error::StreamError;

pub use handle::{PlaybackState, StreamHandle};

/// Stable, caller-assigned stream identifier.
///
/// Identifiers with a numeric suffix (`stream-2`, `stream-10`) order by that
/// index, so `stream-2` sorts before `stream-10`. Anything else compares
/// lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split `prefix-N` into `(prefix, Some(N))`.
    fn index_key(&self) -> (&str, Option<u64>) {
        match self.0.rsplit_once('-') {
            Some((prefix, suffix))
                if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
            {
                match suffix.parse::<u64>() {
                    Ok(index) => (prefix, Some(index)),
                    Err(_) => (self.0.as_str(), None),
                }
            }
            _ => (self.0.as_str(), None),
        }
    }
}

impl Ord for StreamId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index_key()
            .cmp(&other.index_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for StreamId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for StreamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StreamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Notification emitted by a stream about its own state.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Metadata arrived; `duration` is in seconds and may still be unknown (0 or NaN).
    MetadataLoaded { duration: f64 },
    DurationChanged { duration: f64 },
    TimeUpdate { position: f64 },
    Play,
    Pause,
    Ended,
    RateChange { rate: f64 },
    /// Playback was requested but the host refused to start it.
    PlayRejected { reason: String },
}

/// A [`StreamEvent`] tagged with the stream that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub id: StreamId,
    pub event: StreamEvent,
}

/// Per-stream sending half of the session's event channel.
///
/// Handed to a stream on subscribe; the stream keeps it until unsubscribed.
#[derive(Debug, Clone)]
pub struct EventSender {
    id: StreamId,
    tx: Sender<TaggedEvent>,
}

impl EventSender {
    pub(crate) fn new(id: StreamId, tx: Sender<TaggedEvent>) -> Self {
        Self { id, tx }
    }

    /// Queue an event for the session. Returns false once the session is gone.
    pub fn send(&self, event: StreamEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                id: self.id.clone(),
                event,
            })
            .is_ok()
    }
}

/// Capability exposed by one independently clocked playback resource.
///
/// Reads are snapshots. Other readers may observe the same resource at any
/// time, so values are only eventually consistent with the session's writes.
pub trait PlayableStream {
    /// Current position in seconds.
    fn position(&self) -> f64;
    /// Duration in seconds, `None` while unknown.
    fn duration(&self) -> Option<f64>;
    fn is_paused(&self) -> bool;
    fn is_ended(&self) -> bool;
    fn playback_rate(&self) -> f64;
    /// Seconds of media buffered ahead of the current position.
    fn buffered_ahead(&self) -> f64;

    fn set_position(&mut self, position: f64) -> Result<(), StreamError>;
    fn set_playback_rate(&mut self, rate: f64) -> Result<(), StreamError>;
    fn play(&mut self) -> Result<(), StreamError>;
    fn pause(&mut self);

    /// Start delivering [`StreamEvent`]s through `events`.
    fn subscribe(&mut self, events: EventSender);
    /// Stop delivering events. Called when the stream is unregistered.
    fn unsubscribe(&mut self);
}
