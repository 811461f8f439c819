//! # Tandem Sync Library
//!
//! Keeps several independently clocked playback streams aligned to one
//! elected master. A host registers its streams with a [`SyncSession`],
//! drives transport through it, and calls [`SyncSession::tick`] once per
//! frame while the session is monitoring.
//!
//! Drift is corrected in three tiers: small drift is left alone, moderate
//! drift is absorbed by nudging the follower's rate, and large drift is
//! fixed by repositioning the follower, after which it is left to settle.

pub mod error;
pub mod registry;
pub mod session;
pub mod settings;
pub mod sim;
pub mod stream;
pub mod sync;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use error::{StreamError, SyncError};
pub use session::{FollowerReport, SyncSession, TickReport};
pub use settings::SyncSettings;
pub use sim::SimulatedStream;
pub use stream::{EventSender, PlayableStream, StreamEvent, StreamId};
pub use sync::{Correction, SyncStatus, SyncStatusChange};
