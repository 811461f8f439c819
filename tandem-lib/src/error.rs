//! Error types for stream capabilities and the sync session.
//!
//! Nothing here is fatal to a session. Stream errors raised while correcting
//! drift are logged and the correction is retried on a later tick; errors from
//! explicit transport calls are handed back to the caller.

use thiserror::Error;

use crate::stream::StreamId;

/// Failure reported by a [`PlayableStream`](crate::stream::PlayableStream).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// Not enough data is buffered to perform the operation safely.
    #[error("stream is not ready")]
    NotReady,
    /// The host declined to start playback.
    #[error("play rejected: {0}")]
    PlayRejected(String),
    /// The underlying resource is gone or otherwise unusable.
    #[error("stream unavailable: {0}")]
    Unavailable(String),
}

/// Error type returned by [`SyncSession`](crate::session::SyncSession) operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown stream {0}")]
    UnknownStream(StreamId),
    #[error("stream {0} is already registered")]
    DuplicateStream(StreamId),
    #[error("no master stream is registered")]
    NoMaster,
    #[error("invalid seek time {0}")]
    InvalidTime(f64),
    #[error("invalid playback rate {0}")]
    InvalidRate(f64),
    #[error("stream {id}: {source}")]
    Stream {
        id: StreamId,
        #[source]
        source: StreamError,
    },
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub(crate) fn stream(id: &StreamId, source: StreamError) -> Self {
        Self::Stream {
            id: id.clone(),
            source,
        }
    }

    /// Return true if this error is a rejected `play()` request.
    pub fn is_play_rejected(&self) -> bool {
        matches!(
            self,
            Self::Stream {
                source: StreamError::PlayRejected(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_carries_id_in_message() {
        let err = SyncError::stream(
            &StreamId::from("stream-3"),
            StreamError::PlayRejected("autoplay blocked".into()),
        );
        assert_eq!(
            err.to_string(),
            "stream stream-3: play rejected: autoplay blocked"
        );
        assert!(err.is_play_rejected());
    }

    #[test]
    fn not_ready_is_not_a_rejection() {
        let err = SyncError::stream(&StreamId::from("stream-1"), StreamError::NotReady);
        assert!(!err.is_play_rejected());
    }
}
