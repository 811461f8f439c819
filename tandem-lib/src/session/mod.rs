//! Synchronization session: the controller hosts talk to.
//!
//! `SyncSession` owns the registry, the elected master, the drift monitor and
//! the correction policy. Its impl is split by concern:
//!
//! - `registration` registers streams and re-elects the master.
//! - `transport` exposes play/pause/seek/rate to the host.
//! - `events` turns stream notifications into master state transitions.
//! - `tick` runs one drift measurement and correction pass.

mod events;
mod registration;
mod tick;
mod transport;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::registry::StreamRegistry;
use crate::settings::SyncSettings;
use crate::stream::{StreamHandle, StreamId, TaggedEvent};
use crate::sync::{
    follower_order, CorrectionPolicy, DriftMonitor, SyncStatus, SyncStatusChange,
};

pub use tick::{FollowerReport, TickReport};

type StatusListener = Box<dyn FnMut(&SyncStatusChange)>;

/// Keeps every registered stream aligned to the elected master.
///
/// All methods run on the host's control thread. Streams report back through
/// an internal channel that is drained at the start of every [`tick`] and at
/// the end of every transport call.
///
/// [`tick`]: SyncSession::tick
pub struct SyncSession {
    settings: SyncSettings,
    registry: StreamRegistry,
    master: Option<StreamId>,
    base_rate: f64,
    monitor: DriftMonitor,
    policy: CorrectionPolicy,
    events_tx: Sender<TaggedEvent>,
    events_rx: Receiver<TaggedEvent>,
    changes: Vec<SyncStatusChange>,
    listener: Option<StatusListener>,
}

impl fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSession")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("master", &self.master)
            .field("base_rate", &self.base_rate)
            .field("monitor", &self.monitor)
            .field("pending_changes", &self.changes.len())
            .finish()
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl SyncSession {
    pub fn new(settings: SyncSettings) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            settings,
            registry: StreamRegistry::new(),
            master: None,
            base_rate: 1.0,
            monitor: DriftMonitor::new(),
            policy: CorrectionPolicy::new(settings),
            events_tx,
            events_rx,
            changes: Vec::new(),
            listener: None,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Currently elected master.
    pub fn master_id(&self) -> Option<&StreamId> {
        self.master.as_ref()
    }

    pub fn is_master(&self, id: &StreamId) -> bool {
        self.master.as_ref() == Some(id)
    }

    /// Rate the master runs at and tuning scales from.
    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// True while the drift loop is running; hosts schedule ticks only then.
    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    pub fn stream_count(&self) -> usize {
        self.registry.len()
    }

    pub fn handle(&self, id: &StreamId) -> Option<&StreamHandle> {
        self.registry.get(id).map(|entry| &entry.handle)
    }

    /// Master first, then followers in identifier order.
    pub fn ordering(&self) -> Vec<StreamId> {
        let mut ordering: Vec<StreamId> = self.master.iter().cloned().collect();
        ordering.extend(self.followers());
        ordering
    }

    pub(crate) fn followers(&self) -> Vec<StreamId> {
        follower_order(&self.registry, self.master.as_ref())
    }

    /// Sync classification of a stream. Unknown streams and the master read as synced.
    pub fn sync_status(&self, id: &StreamId) -> SyncStatus {
        if self.is_master(id) {
            return SyncStatus::Synced;
        }
        self.registry
            .get(id)
            .map(|entry| entry.sync.status())
            .unwrap_or_default()
    }

    /// Classification of every follower.
    pub fn sync_statuses(&self) -> BTreeMap<StreamId, SyncStatus> {
        self.followers()
            .into_iter()
            .map(|id| {
                let status = self.sync_status(&id);
                (id, status)
            })
            .collect()
    }

    /// Longest known duration across all streams, 0 if none is known.
    pub fn max_duration(&self) -> f64 {
        self.registry.max_duration()
    }

    /// Install the callback that receives each classification change.
    pub fn set_status_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&SyncStatusChange) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Drain the classification changes recorded since the last call.
    pub fn take_status_changes(&mut self) -> Vec<SyncStatusChange> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn publish_change(&mut self, change: SyncStatusChange) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&change);
        }
        self.changes.push(change);
    }
}
