//! Stream notifications and the master's play/stop state machine.
//!
//! `Stopped -> Running` when the master starts playing, `Running -> Stopped`
//! when it pauses, ends or has its play request rejected. Follower
//! notifications only refresh their cached state.

use log::{debug, trace, warn};

use crate::stream::{PlaybackState, StreamEvent, TaggedEvent};

use super::SyncSession;

impl SyncSession {
    /// Handle every queued stream notification. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(tagged) = self.events_rx.try_recv() {
            self.handle_event(tagged);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, tagged: TaggedEvent) {
        let TaggedEvent { id, event } = tagged;
        let is_master = self.is_master(&id);
        let Some(entry) = self.registry.get_mut(&id) else {
            trace!("Dropping {:?} from unregistered stream {}", event, id);
            return;
        };
        let handle = &mut entry.handle;

        match event {
            StreamEvent::MetadataLoaded { duration } | StreamEvent::DurationChanged { duration } => {
                if handle.set_duration(duration) {
                    debug!("Stream {} duration is now {:.3}s", id, handle.duration());
                    self.reelect(false);
                }
            }
            StreamEvent::TimeUpdate { position } => handle.note_position(position),
            StreamEvent::Play => {
                handle.note_state(PlaybackState::Playing);
                if is_master {
                    self.on_master_play();
                }
            }
            StreamEvent::Pause => {
                handle.note_state(PlaybackState::Paused);
                if is_master {
                    self.on_master_stop();
                }
            }
            StreamEvent::Ended => {
                handle.note_state(PlaybackState::Ended);
                if is_master {
                    self.on_master_stop();
                }
            }
            StreamEvent::RateChange { rate } => {
                handle.note_rate(rate);
                if is_master {
                    self.on_master_rate(rate);
                }
            }
            StreamEvent::PlayRejected { reason } => {
                warn!("Play rejected on {}: {}", id, reason);
                handle.note_state(PlaybackState::Paused);
                if is_master {
                    self.on_master_stop();
                }
            }
        }
    }

    /// Master started: resume paused followers at the master's rate, then run the loop.
    pub(crate) fn on_master_play(&mut self) {
        let Some(master) = self.master.clone() else {
            return;
        };
        let Some(rate) = self.registry.get_mut(&master).map(|entry| {
            entry.handle.refresh();
            entry.handle.rate()
        }) else {
            return;
        };

        for id in self.followers() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            let handle = &mut entry.handle;
            handle.refresh();
            if handle.is_paused() {
                if let Err(err) = handle.play() {
                    warn!("Auto-play follow error on {}: {}", id, err);
                }
            }
            if let Err(err) = handle.set_rate(rate) {
                warn!("Could not match rate {:.3} on {}: {}", rate, id, err);
            }
            entry.sync.set_tuning(false);
        }

        self.monitor.start(&master);
    }

    /// Master paused or ended: pause every follower that has not ended and stop the loop.
    pub(crate) fn on_master_stop(&mut self) {
        for id in self.followers() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            entry.handle.refresh();
            if !entry.handle.is_ended() {
                entry.handle.pause();
            }
        }
        self.monitor.stop();
    }

    /// Master rate changed: every follower follows immediately, tuning is dropped.
    pub(crate) fn on_master_rate(&mut self, rate: f64) {
        self.base_rate = rate;
        for id in self.followers() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            if let Err(err) = entry.handle.set_rate(rate) {
                warn!("Could not propagate rate {:.3} to {}: {}", rate, id, err);
            }
            entry.sync.set_tuning(false);
        }
    }
}
