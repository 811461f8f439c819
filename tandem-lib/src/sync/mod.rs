//! Master election, drift measurement and drift correction.

pub mod master;
pub mod monitor;
pub mod policy;

use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::stream::StreamId;

pub use master::{elect, follower_order, select_master};
pub use monitor::{DriftMonitor, MasterSample, MonitorState};
pub use policy::{Correction, CorrectionPolicy};

/// How far a follower sits from the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Tuning,
    Desynced,
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Synced => "synced",
            Self::Tuning => "tuning",
            Self::Desynced => "desynced",
        };
        f.write_str(label)
    }
}

/// A follower moved from one classification to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatusChange {
    pub id: StreamId,
    pub from: SyncStatus,
    pub to: SyncStatus,
}

/// Per-follower correction record owned by the session.
#[derive(Debug, Clone, Default)]
pub struct FollowerSync {
    status: SyncStatus,
    tuning: bool,
    locked_until: Option<Instant>,
}

impl FollowerSync {
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SyncStatus) {
        self.status = status;
    }

    /// True while the follower's rate is scaled away from the master's.
    pub fn is_tuning(&self) -> bool {
        self.tuning
    }

    pub(crate) fn set_tuning(&mut self, tuning: bool) {
        self.tuning = tuning;
    }

    /// True while a hard reposition is settling. An expired lock is cleared.
    pub fn is_locked(&mut self, now: Instant) -> bool {
        match self.locked_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.locked_until = None;
                false
            }
            None => false,
        }
    }

    pub(crate) fn lock_for(&mut self, now: Instant, window: Duration) {
        self.locked_until = Some(now + window);
    }

    /// Forget tuning and locks, e.g. when the master changes.
    pub(crate) fn reset_corrections(&mut self) {
        self.tuning = false;
        self.locked_until = None;
    }
}
