//! Tuning constants for drift classification and correction.

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

const DEFAULT_SYNC_THRESHOLD: f64 = 0.05;
const DEFAULT_DESYNC_THRESHOLD: f64 = 0.3;
const DEFAULT_HARD_SYNC_THRESHOLD: f64 = 0.5;
const DEFAULT_SETTLE_WINDOW_MS: u64 = 500;
const DEFAULT_SLOW_FACTOR: f64 = 0.95;
const DEFAULT_FAST_FACTOR: f64 = 1.05;
const DEFAULT_RATE_EPSILON: f64 = 0.01;
const DEFAULT_MASTER_TOLERANCE: f64 = 0.5;
const DEFAULT_SEEK_READY_BUFFER_SECS: f64 = 0.25;
const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Serialized sync configuration. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Drift (seconds) below which a follower counts as synced.
    pub sync_threshold: f64,
    /// Drift above which a follower is reported as desynced.
    pub desync_threshold: f64,
    /// Drift above which a hard reposition is attempted.
    pub hard_sync_threshold: f64,
    /// How long a hard reposition suppresses the next one.
    pub settle_window_ms: u64,
    /// Rate factor applied to a follower that is ahead of the master.
    pub slow_factor: f64,
    /// Rate factor applied to a follower that is behind the master.
    pub fast_factor: f64,
    /// Smallest rate change worth writing to a stream.
    pub rate_epsilon: f64,
    /// Durations closer than this are equal for master election.
    pub master_tolerance: f64,
    /// Buffered-ahead seconds a follower needs before it may be repositioned.
    pub seek_ready_buffer_secs: f64,
    /// Frame cadence hosts should tick at.
    pub frame_interval_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_threshold: DEFAULT_SYNC_THRESHOLD,
            desync_threshold: DEFAULT_DESYNC_THRESHOLD,
            hard_sync_threshold: DEFAULT_HARD_SYNC_THRESHOLD,
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            slow_factor: DEFAULT_SLOW_FACTOR,
            fast_factor: DEFAULT_FAST_FACTOR,
            rate_epsilon: DEFAULT_RATE_EPSILON,
            master_tolerance: DEFAULT_MASTER_TOLERANCE,
            seek_ready_buffer_secs: DEFAULT_SEEK_READY_BUFFER_SECS,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl SyncSettings {
    /// Parse and validate settings from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, SyncError> {
        let settings: SyncSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        info!("Loaded sync settings from {}", path.display());
        Ok(settings)
    }

    /// Check that the thresholds and factors describe a usable policy.
    pub fn validate(&self) -> Result<(), SyncError> {
        let finite = [
            self.sync_threshold,
            self.desync_threshold,
            self.hard_sync_threshold,
            self.slow_factor,
            self.fast_factor,
            self.rate_epsilon,
            self.master_tolerance,
            self.seek_ready_buffer_secs,
        ];
        if finite.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(SyncError::Settings(
                "values must be finite and non-negative".to_string(),
            ));
        }
        if self.sync_threshold >= self.desync_threshold {
            return Err(SyncError::Settings(format!(
                "sync_threshold ({}) must be below desync_threshold ({})",
                self.sync_threshold, self.desync_threshold
            )));
        }
        if self.sync_threshold >= self.hard_sync_threshold {
            return Err(SyncError::Settings(format!(
                "sync_threshold ({}) must be below hard_sync_threshold ({})",
                self.sync_threshold, self.hard_sync_threshold
            )));
        }
        if !(self.slow_factor > 0.0 && self.slow_factor < 1.0) {
            return Err(SyncError::Settings(format!(
                "slow_factor ({}) must be in (0, 1)",
                self.slow_factor
            )));
        }
        if self.fast_factor <= 1.0 {
            return Err(SyncError::Settings(format!(
                "fast_factor ({}) must be above 1",
                self.fast_factor
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(SyncError::Settings(
                "frame_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Pretty JSON payload, as emitted by `tandem create settings-json`.
    pub fn to_json_pretty(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = SyncSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.settle_window(), Duration::from_millis(500));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings =
            SyncSettings::from_json_str(r#"{"hard_sync_threshold": 0.8}"#).expect("parse");
        assert_eq!(settings.hard_sync_threshold, 0.8);
        assert_eq!(settings.sync_threshold, DEFAULT_SYNC_THRESHOLD);
        assert_eq!(settings.slow_factor, DEFAULT_SLOW_FACTOR);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = SyncSettings::from_json_str(r#"{"sync_threshold": 0.4, "desync_threshold": 0.3}"#)
            .expect_err("should reject");
        assert!(matches!(err, SyncError::Settings(_)));
    }

    #[test]
    fn fast_factor_must_speed_up() {
        let err = SyncSettings::from_json_str(r#"{"fast_factor": 0.9}"#).expect_err("reject");
        assert!(err.to_string().contains("fast_factor"));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = SyncSettings::from_json_str("{not json").expect_err("reject");
        assert!(matches!(err, SyncError::Json(_)));
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("tandem-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("settings.json");
        let mut settings = SyncSettings::default();
        settings.settle_window_ms = 750;
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(settings.to_json_pretty().expect("json").as_bytes())
            .expect("write");
        drop(file);

        let loaded = SyncSettings::from_json_file(&path).expect("load");
        assert_eq!(loaded, settings);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SyncSettings::from_json_file("/nonexistent/tandem/settings.json")
            .expect_err("reject");
        assert!(matches!(err, SyncError::Io(_)));
    }
}
