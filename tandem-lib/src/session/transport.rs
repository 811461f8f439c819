//! Host-facing transport controls.
//!
//! Play and pause only touch the master; followers react to the master's own
//! notifications. Seek and rate changes are applied to every stream directly.

use log::{info, warn};

use crate::error::SyncError;
use crate::stream::StreamId;

use super::SyncSession;

impl SyncSession {
    /// Start the master. Followers follow once it reports that it is playing.
    ///
    /// A rejected play is returned to the caller and the master stays paused.
    pub fn play(&mut self) -> Result<(), SyncError> {
        let master = self.require_master()?;
        let result = match self.registry.get_mut(&master) {
            Some(entry) => entry.handle.play(),
            None => return Err(SyncError::UnknownStream(master)),
        };
        self.pump_events();
        result.map_err(|err| {
            warn!("Master play error on {}: {}", master, err);
            SyncError::stream(&master, err)
        })
    }

    /// Pause the master. Followers pause when it reports the pause.
    pub fn pause(&mut self) -> Result<(), SyncError> {
        let master = self.require_master()?;
        match self.registry.get_mut(&master) {
            Some(entry) => entry.handle.pause(),
            None => return Err(SyncError::UnknownStream(master)),
        }
        self.pump_events();
        Ok(())
    }

    /// Move every stream to `time` seconds, regardless of current drift.
    ///
    /// Follower failures are logged; a master failure is returned. While the
    /// master plays, followers left paused by the seek (e.g. reopened after
    /// they ended) are started again at the master's rate.
    pub fn seek(&mut self, time: f64) -> Result<(), SyncError> {
        if !time.is_finite() || time < 0.0 {
            return Err(SyncError::InvalidTime(time));
        }
        let master = self.require_master()?;
        info!("Seeking all streams to {:.3}s", time);

        let result = match self.registry.get_mut(&master) {
            Some(entry) => entry.handle.seek(time),
            None => return Err(SyncError::UnknownStream(master)),
        };
        for id in self.followers() {
            if let Some(entry) = self.registry.get_mut(&id) {
                if let Err(err) = entry.handle.seek(time) {
                    warn!("Seek to {:.3}s failed on {}: {}", time, id, err);
                }
            }
        }
        self.pump_events();

        let master_playing = self
            .registry
            .get_mut(&master)
            .map(|entry| {
                entry.handle.refresh();
                entry.handle.is_playing()
            })
            .unwrap_or(false);
        if master_playing {
            self.on_master_play();
            self.pump_events();
        }
        result.map_err(|err| SyncError::stream(&master, err))
    }

    /// Set every stream's rate. This becomes the baseline tuning scales from.
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<(), SyncError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SyncError::InvalidRate(rate));
        }
        let master = self.require_master()?;
        info!("Setting playback rate to {:.3}x", rate);
        self.base_rate = rate;

        let mut result = Ok(());
        for id in self.ordering() {
            let Some(entry) = self.registry.get_mut(&id) else {
                continue;
            };
            entry.sync.set_tuning(false);
            if let Err(err) = entry.handle.set_rate(rate) {
                if id == master {
                    result = Err(SyncError::stream(&master, err));
                } else {
                    warn!("Rate {:.3} failed on {}: {}", rate, id, err);
                }
            }
        }
        self.pump_events();
        result
    }

    fn require_master(&self) -> Result<StreamId, SyncError> {
        self.master.clone().ok_or(SyncError::NoMaster)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use crate::error::SyncError;
    use crate::session::tests::{id, session_with};
    use crate::session::SyncSession;
    use crate::sync::{Correction, SyncStatus};

    #[test]
    fn transport_without_streams_reports_no_master() {
        let mut session = SyncSession::default();
        assert!(matches!(session.play(), Err(SyncError::NoMaster)));
        assert!(matches!(session.pause(), Err(SyncError::NoMaster)));
        assert!(matches!(session.seek(1.0), Err(SyncError::NoMaster)));
        assert!(matches!(
            session.set_playback_rate(1.0),
            Err(SyncError::NoMaster)
        ));
    }

    #[test]
    fn play_and_pause_drive_the_monitor() {
        let (mut session, fakes) = session_with(&[120.0, 60.0]);
        session.play().expect("play");
        assert!(session.is_monitoring());
        assert!(!fakes[1].paused());

        session.pause().expect("pause");
        assert!(!session.is_monitoring());
        assert!(fakes[0].paused());
        assert!(fakes[1].paused());
    }

    #[test]
    fn rejected_play_is_reported_and_not_fatal() {
        let (mut session, fakes) = session_with(&[120.0, 60.0]);
        fakes[0].reject_play("autoplay policy");

        let err = session.play().expect_err("rejected");
        assert!(err.is_play_rejected());
        assert!(!session.is_monitoring());
        assert!(fakes[0].paused());
        assert!(fakes[1].paused());

        // The session keeps working once the host allows playback.
        session.seek(5.0).expect("seek");
        assert_eq!(fakes[1].current_position(), 5.0);
    }

    #[test]
    fn rejected_follower_stays_paused() {
        let (mut session, fakes) = session_with(&[120.0, 60.0, 90.0]);
        fakes[1].reject_play("decoder busy");
        session.play().expect("master play");
        assert!(session.is_monitoring());
        assert!(fakes[1].paused());
        assert!(!fakes[2].paused());
    }

    #[test]
    fn seek_moves_everyone_unconditionally() {
        let (mut session, fakes) = session_with(&[120.0, 60.0, 90.0]);
        session.play().expect("play");
        fakes[1].place_at(11.0);
        fakes[2].place_at(9.97);
        fakes[0].place_at(10.0);
        session.tick(Instant::now());
        assert_eq!(session.sync_status(&id("stream-1")), SyncStatus::Desynced);

        session.seek(30.0).expect("seek");
        for fake in &fakes {
            assert_eq!(fake.current_position(), 30.0);
        }
    }

    #[test]
    fn seeking_back_resumes_ended_follower() {
        let (mut session, fakes) = session_with(&[120.0, 60.0]);
        session.play().expect("play");
        fakes[1].finish();
        fakes[0].place_at(70.0);
        session.tick(Instant::now());
        assert!(fakes[1].paused());

        session.seek(10.0).expect("seek");
        assert!(!fakes[1].paused());
        assert_eq!(fakes[1].current_position(), 10.0);

        // In step with the master, so no repeated hard seeks.
        let report = session.tick(Instant::now());
        assert_eq!(
            report.follower(&id("stream-1")).map(|f| f.correction),
            Some(Correction::Hold)
        );
        assert_eq!(fakes[1].seek_count(), 1);
    }

    #[test]
    fn seek_while_paused_leaves_followers_paused() {
        let (mut session, fakes) = session_with(&[120.0, 60.0]);
        session.seek(20.0).expect("seek");
        assert!(fakes[0].paused());
        assert!(fakes[1].paused());
        assert!(!session.is_monitoring());
    }

    #[test]
    fn seek_rejects_invalid_times() {
        let (mut session, _) = session_with(&[120.0]);
        assert!(matches!(session.seek(-1.0), Err(SyncError::InvalidTime(_))));
        assert!(matches!(
            session.seek(f64::NAN),
            Err(SyncError::InvalidTime(_))
        ));
    }

    #[test]
    fn follower_seek_failure_does_not_fail_the_seek() {
        let (mut session, fakes) = session_with(&[120.0, 60.0]);
        fakes[1].seeks_not_ready(true);
        session.seek(12.0).expect("master seek succeeds");
        assert_eq!(fakes[0].current_position(), 12.0);
        assert_eq!(fakes[1].current_position(), 0.0);
    }

    #[test]
    fn playback_rate_is_new_tuning_baseline() {
        let (mut session, fakes) = session_with(&[120.0, 60.0]);
        session.play().expect("play");
        session.set_playback_rate(2.0).expect("rate");
        assert_eq!(fakes[0].current_rate(), 2.0);
        assert_eq!(fakes[1].current_rate(), 2.0);

        fakes[0].place_at(10.0);
        fakes[1].place_at(10.1);
        let report = session.tick(Instant::now());
        assert_eq!(
            report.followers[0].correction,
            Correction::RateTuned { rate: 2.0 * 0.95 }
        );
        assert_eq!(fakes[1].current_rate(), 2.0 * 0.95);
    }

    #[test]
    fn invalid_rates_are_rejected() {
        let (mut session, fakes) = session_with(&[120.0]);
        assert!(matches!(
            session.set_playback_rate(0.0),
            Err(SyncError::InvalidRate(_))
        ));
        assert!(matches!(
            session.set_playback_rate(f64::INFINITY),
            Err(SyncError::InvalidRate(_))
        ));
        assert_eq!(fakes[0].current_rate(), 1.0);
    }
}
