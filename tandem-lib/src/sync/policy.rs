//! Three-tier drift correction.
//!
//! - Inside the dead zone a tuned follower gets the master's rate back.
//! - Past the hard threshold the follower is repositioned onto the master,
//!   then locked for the settle window so the seek can land.
//! - In between the follower's rate is scaled a few percent toward the master.

use std::time::Instant;

use log::{debug, warn};

use crate::error::StreamError;
use crate::settings::SyncSettings;
use crate::stream::StreamHandle;

use super::{FollowerSync, MasterSample};

/// What the policy did for one follower on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Nothing to do.
    Hold,
    /// Tuning ended; the follower runs at the master's rate again.
    RateRestored { rate: f64 },
    /// The follower's rate was scaled to close the gap.
    RateTuned { rate: f64 },
    /// The follower was moved onto the master's position.
    Repositioned { from: f64, to: f64 },
    /// A hard reposition is still settling.
    Locked,
    /// The follower cannot seek yet; retried next tick.
    NotReady,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrectionPolicy {
    settings: SyncSettings,
}

impl CorrectionPolicy {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Buffering-readiness predicate for hard repositions.
    pub fn ready_to_seek(&self, follower: &StreamHandle) -> bool {
        follower.buffered_ahead() >= self.settings.seek_ready_buffer_secs
    }

    /// Correct one follower given its signed `drift` from the master.
    pub fn apply(
        &self,
        follower: &mut StreamHandle,
        sync: &mut FollowerSync,
        drift: f64,
        master: &MasterSample,
        now: Instant,
    ) -> Correction {
        let magnitude = drift.abs();

        if magnitude < self.settings.sync_threshold {
            return self.release_tuning(follower, sync, master);
        }

        if magnitude > self.settings.hard_sync_threshold {
            return self.reposition(follower, sync, drift, master, now);
        }

        self.tune(follower, sync, drift, master)
    }

    fn release_tuning(
        &self,
        follower: &mut StreamHandle,
        sync: &mut FollowerSync,
        master: &MasterSample,
    ) -> Correction {
        if !sync.is_tuning() && follower.rate() == master.rate {
            return Correction::Hold;
        }
        match follower.set_rate(master.rate) {
            Ok(()) => {
                sync.set_tuning(false);
                Correction::RateRestored { rate: master.rate }
            }
            Err(err) => {
                warn!("[Sync] Could not restore rate on {}: {}", follower.id(), err);
                Correction::Hold
            }
        }
    }

    fn reposition(
        &self,
        follower: &mut StreamHandle,
        sync: &mut FollowerSync,
        drift: f64,
        master: &MasterSample,
        now: Instant,
    ) -> Correction {
        if sync.is_locked(now) {
            return Correction::Locked;
        }
        if !self.ready_to_seek(follower) {
            return Correction::NotReady;
        }
        let from = follower.position();
        match follower.seek(master.position) {
            Ok(()) => {
                debug!(
                    "[Sync] Hard seeking {} (drift: {:.3}s)",
                    follower.id(),
                    drift
                );
                sync.lock_for(now, self.settings.settle_window());
                Correction::Repositioned {
                    from,
                    to: master.position,
                }
            }
            Err(StreamError::NotReady) => Correction::NotReady,
            Err(err) => {
                warn!("[Sync] Hard seek on {} failed: {}", follower.id(), err);
                Correction::NotReady
            }
        }
    }

    fn tune(
        &self,
        follower: &mut StreamHandle,
        sync: &mut FollowerSync,
        drift: f64,
        master: &MasterSample,
    ) -> Correction {
        let factor = if drift > 0.0 {
            self.settings.slow_factor
        } else {
            self.settings.fast_factor
        };
        let rate = master.rate * factor;
        if (follower.rate() - rate).abs() <= self.settings.rate_epsilon {
            return Correction::Hold;
        }
        match follower.set_rate(rate) {
            Ok(()) => {
                debug!(
                    "[Sync] Tuning {} to {:.3}x (drift: {:.3}s)",
                    follower.id(),
                    rate,
                    drift
                );
                sync.set_tuning(true);
                Correction::RateTuned { rate }
            }
            Err(err) => {
                warn!("[Sync] Could not tune rate on {}: {}", follower.id(), err);
                Correction::Hold
            }
        }
    }
}
