//! Drift measurement loop state.
//!
//! The host drives ticks at its frame cadence. The monitor only decides
//! whether a tick does any work, measures each follower against the master
//! and classifies the result. Corrections are left to
//! [`CorrectionPolicy`](super::CorrectionPolicy).

use log::info;

use crate::settings::SyncSettings;
use crate::stream::{StreamHandle, StreamId};

use super::{FollowerSync, SyncStatus, SyncStatusChange};

/// Loop state. Ticks are only scheduled while `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Stopped,
    Running,
}

/// Master clock reading taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterSample {
    pub position: f64,
    pub rate: f64,
}

#[derive(Debug, Default)]
pub struct DriftMonitor {
    state: MonitorState,
    master: Option<StreamId>,
    ticks: u64,
}

impl DriftMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == MonitorState::Running
    }

    /// Master the running loop measures against.
    pub fn master(&self) -> Option<&StreamId> {
        self.master.as_ref()
    }

    /// Number of ticks that took measurements since the last start.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Start (or retarget) the loop. Returns true if anything changed.
    pub fn start(&mut self, master: &StreamId) -> bool {
        if self.is_running() && self.master.as_ref() == Some(master) {
            return false;
        }
        info!("Drift monitor started against {}", master);
        self.state = MonitorState::Running;
        self.master = Some(master.clone());
        self.ticks = 0;
        true
    }

    /// Stop the loop. Idempotent and immediate.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        if let Some(master) = &self.master {
            info!("Drift monitor stopped ({} ticks against {})", self.ticks, master);
        }
        self.state = MonitorState::Stopped;
        self.master = None;
        true
    }

    /// Sample the master for this tick.
    ///
    /// Returns `None` when the loop is stopped, the handle is not the master
    /// the loop was started for, or the master is not playing. A `None` tick
    /// measures and corrects nothing.
    pub fn sample(&mut self, master: &StreamHandle) -> Option<MasterSample> {
        if !self.is_running() || self.master.as_ref() != Some(master.id()) {
            return None;
        }
        if !master.is_playing() {
            return None;
        }
        self.ticks += 1;
        Some(MasterSample {
            position: master.position(),
            rate: master.rate(),
        })
    }

    /// Signed drift of `follower` (positive when ahead), `None` once it has ended.
    pub fn measure(sample: &MasterSample, follower: &StreamHandle) -> Option<f64> {
        if follower.is_ended() {
            return None;
        }
        Some(follower.position() - sample.position)
    }

    /// Classify a drift against the sync and desync thresholds.
    pub fn classify(drift: f64, settings: &SyncSettings) -> SyncStatus {
        let magnitude = drift.abs();
        if magnitude > settings.desync_threshold {
            SyncStatus::Desynced
        } else if magnitude > settings.sync_threshold {
            SyncStatus::Tuning
        } else {
            SyncStatus::Synced
        }
    }

    /// Store `status` on the follower, reporting a change only on transition.
    pub fn record(
        id: &StreamId,
        sync: &mut FollowerSync,
        status: SyncStatus,
    ) -> Option<SyncStatusChange> {
        let from = sync.status();
        if from == status {
            return None;
        }
        sync.set_status(status);
        Some(SyncStatusChange {
            id: id.clone(),
            from,
            to: status,
        })
    }
}
