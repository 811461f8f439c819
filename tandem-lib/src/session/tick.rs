//! One pass of the drift loop.

use std::time::Instant;

use log::debug;

use crate::stream::StreamId;
use crate::sync::{Correction, DriftMonitor, SyncStatus};

use super::SyncSession;

/// Outcome of one follower's measurement on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowerReport {
    pub id: StreamId,
    /// Follower position minus master position, in seconds.
    pub drift: f64,
    pub status: SyncStatus,
    pub correction: Correction,
}

/// What a tick measured. Empty when the tick was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub master_position: Option<f64>,
    pub followers: Vec<FollowerReport>,
}

impl TickReport {
    pub fn skipped(&self) -> bool {
        self.master_position.is_none()
    }

    pub fn follower(&self, id: &StreamId) -> Option<&FollowerReport> {
        self.followers.iter().find(|report| &report.id == id)
    }
}

impl SyncSession {
    /// Run one measurement and correction pass.
    ///
    /// Hosts call this once per rendered frame while [`is_monitoring`] is true.
    /// Queued stream notifications are handled first. Nothing is measured
    /// while the loop is stopped or the master is not playing. Ended
    /// followers are left alone.
    ///
    /// [`is_monitoring`]: SyncSession::is_monitoring
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.pump_events();
        if !self.monitor.is_running() {
            return TickReport::default();
        }
        let Some(master) = self.master.clone() else {
            return TickReport::default();
        };

        let sample = match self.registry.get_mut(&master) {
            Some(entry) => {
                entry.handle.refresh();
                self.monitor.sample(&entry.handle)
            }
            None => None,
        };
        let Some(sample) = sample else {
            return TickReport::default();
        };

        let mut report = TickReport {
            master_position: Some(sample.position),
            followers: Vec::new(),
        };
        let mut changes = Vec::new();

        for id in self.followers() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            entry.handle.refresh();
            let Some(drift) = DriftMonitor::measure(&sample, &entry.handle) else {
                continue;
            };

            let status = DriftMonitor::classify(drift, &self.settings);
            if let Some(change) = DriftMonitor::record(&id, &mut entry.sync, status) {
                changes.push(change);
            }
            let correction =
                self.policy
                    .apply(&mut entry.handle, &mut entry.sync, drift, &sample, now);

            report.followers.push(FollowerReport {
                id,
                drift,
                status,
                correction,
            });
        }

        for change in changes {
            debug!("Stream {} is now {} (was {})", change.id, change.to, change.from);
            self.publish_change(change);
        }
        report
    }
}
