//! Stream registration and master re-election.

use log::{debug, info, warn};

use crate::error::SyncError;
use crate::stream::{EventSender, PlayableStream, StreamHandle, StreamId};
use crate::sync::{select_master, SyncStatus, SyncStatusChange};

use super::SyncSession;

impl SyncSession {
    /// Register a stream under a caller-assigned identifier.
    ///
    /// The stream is subscribed to the session's event channel and the master
    /// is re-elected. Adding a stream while the master plays brings the new
    /// follower into playback at the master's rate.
    pub fn register_stream(
        &mut self,
        id: impl Into<StreamId>,
        stream: Box<dyn PlayableStream>,
    ) -> Result<(), SyncError> {
        let id = id.into();
        if self.registry.contains(&id) {
            return Err(SyncError::DuplicateStream(id));
        }

        let mut handle = StreamHandle::new(id.clone(), stream);
        handle.subscribe(EventSender::new(id.clone(), self.events_tx.clone()));
        let duration = handle.duration();
        self.registry.insert(handle)?;
        info!("Registered stream {} (duration {:.3}s)", id, duration);

        self.reelect(true);
        Ok(())
    }

    /// Unsubscribe and drop a stream, then re-elect the master.
    pub fn unregister_stream(&mut self, id: &StreamId) -> Result<(), SyncError> {
        let mut entry = self
            .registry
            .remove(id)
            .ok_or_else(|| SyncError::UnknownStream(id.clone()))?;
        entry.handle.unsubscribe();
        info!("Unregistered stream {}", id);

        self.reelect(true);
        Ok(())
    }

    /// Recompute the master from scratch and rebind if it changed.
    ///
    /// `membership_changed` is set when a stream was added or removed. With an
    /// unchanged master that still re-runs the play transition while the loop
    /// is running, so a newly added follower starts alongside the master.
    pub(crate) fn reelect(&mut self, membership_changed: bool) {
        let elected = select_master(&self.registry, self.settings.master_tolerance);
        if elected == self.master {
            if membership_changed && self.monitor.is_running() {
                self.on_master_play();
            }
            return;
        }

        match (&self.master, &elected) {
            (Some(previous), Some(next)) => info!("Master changed: {} -> {}", previous, next),
            (None, Some(next)) => info!("Master elected: {}", next),
            (Some(previous), None) => info!("Master {} removed, no streams left", previous),
            (None, None) => {}
        }

        let was_running = self.monitor.stop();
        let had_master = self.master.is_some();
        self.master = elected;
        for entry in self.registry.entries_mut() {
            entry.sync.reset_corrections();
        }

        let Some(master) = self.master.clone() else {
            return;
        };

        let mut cleared = None;
        let master_playing = match self.registry.get_mut(&master) {
            Some(entry) => {
                entry.handle.refresh();
                if !had_master {
                    self.base_rate = entry.handle.rate();
                } else if entry.handle.rate() != self.base_rate {
                    // A follower promoted mid-tune goes back to the session rate.
                    if let Err(err) = entry.handle.set_rate(self.base_rate) {
                        warn!("Could not reset rate on new master {}: {}", master, err);
                    }
                }
                let from = entry.sync.status();
                if from != SyncStatus::Synced {
                    entry.sync.set_status(SyncStatus::Synced);
                    cleared = Some(SyncStatusChange {
                        id: master.clone(),
                        from,
                        to: SyncStatus::Synced,
                    });
                }
                entry.handle.is_playing()
            }
            None => false,
        };
        if let Some(change) = cleared {
            self.publish_change(change);
        }

        if master_playing {
            self.on_master_play();
        } else if was_running {
            debug!("New master {} is not playing; pausing followers", master);
            self.on_master_stop();
        }
    }
}
