//! `tandem simulate`: drive skewed simulated streams through a session.

use std::time::{Duration, Instant};

use clap::ArgMatches;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tandem_lib::{
    Correction, SimulatedStream, SyncError, SyncSession, SyncSettings, TickReport,
};

use crate::status::{self, StatusArgs, StreamRow};

/// Options for one simulated run.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub durations: Vec<f64>,
    pub skew_ppm: f64,
    pub seed: u64,
    pub seconds: f64,
    pub seek: Option<f64>,
    pub rate: Option<f64>,
    pub report_every: f64,
    pub settings: SyncSettings,
}

/// Correction counts and drift extremes over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub master: Option<String>,
    pub elapsed: f64,
    pub ticks: usize,
    pub hard_seeks: usize,
    pub rate_tunes: usize,
    pub rate_restores: usize,
    pub not_ready: usize,
    pub locked: usize,
    pub status_changes: usize,
    pub max_abs_drift: f64,
    pub final_abs_drift: f64,
}

impl Summary {
    fn count(&mut self, correction: Correction) {
        match correction {
            Correction::Hold => {}
            Correction::RateRestored { .. } => self.rate_restores += 1,
            Correction::RateTuned { .. } => self.rate_tunes += 1,
            Correction::Repositioned { .. } => self.hard_seeks += 1,
            Correction::Locked => self.locked += 1,
            Correction::NotReady => self.not_ready += 1,
        }
    }

    pub fn to_text(&self) -> String {
        format!(
            "Master: {}\nSimulated: {}\nTicks: {}\nHard seeks: {}\nRate tunes: {} (restored {})\nDeferred: {} locked, {} not ready\nStatus changes: {}\nMax drift: {:.3}s\nFinal drift: {:.3}s",
            self.master.as_deref().unwrap_or("none"),
            status::format_time(self.elapsed),
            self.ticks,
            self.hard_seeks,
            self.rate_tunes,
            self.rate_restores,
            self.locked,
            self.not_ready,
            self.status_changes,
            self.max_abs_drift,
            self.final_abs_drift
        )
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "master": self.master,
            "elapsed": self.elapsed,
            "ticks": self.ticks,
            "hard_seeks": self.hard_seeks,
            "rate_tunes": self.rate_tunes,
            "rate_restores": self.rate_restores,
            "locked": self.locked,
            "not_ready": self.not_ready,
            "status_changes": self.status_changes,
            "max_abs_drift": self.max_abs_drift,
            "final_abs_drift": self.final_abs_drift,
        })
    }
}

impl SimulateOptions {
    /// Collect options from the `simulate` subcommand matches.
    pub fn from_matches(args: &ArgMatches) -> Result<Self, SyncError> {
        let seed = args.get_one::<u64>("seed").copied().unwrap_or(42);
        let settings = match args.get_one::<String>("settings") {
            Some(path) => SyncSettings::from_json_file(path)?,
            None => SyncSettings::default(),
        };

        let durations = match args.get_many::<f64>("durations") {
            Some(values) => values.copied().collect(),
            None => {
                let count = args.get_one::<usize>("streams").copied().unwrap_or(3);
                random_durations(count, seed)
            }
        };

        Ok(Self {
            durations,
            skew_ppm: args.get_one::<f64>("skew-ppm").copied().unwrap_or(2000.0),
            seed,
            seconds: args.get_one::<f64>("seconds").copied().unwrap_or(20.0),
            seek: args.get_one::<f64>("seek").copied(),
            rate: args.get_one::<f64>("rate").copied(),
            report_every: args.get_one::<f64>("report-every").copied().unwrap_or(1.0),
            settings,
        })
    }
}

fn random_durations(count: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (rng.gen_range(30.0..180.0_f64) * 10.0).round() / 10.0)
        .collect()
}

/// Run the simulation, printing progress through `out` unless it is `None`.
pub fn run(
    options: &SimulateOptions,
    mut out: Option<&mut dyn FnMut(&str)>,
) -> Result<Summary, SyncError> {
    if options.durations.is_empty() {
        return Err(SyncError::Settings(
            "at least one stream is required".to_string(),
        ));
    }
    if !options.seconds.is_finite() || options.seconds <= 0.0 {
        return Err(SyncError::Settings(format!(
            "simulated time must be positive, got {}",
            options.seconds
        )));
    }
    if !options.skew_ppm.is_finite() || options.skew_ppm < 0.0 || options.skew_ppm >= 1e6 {
        return Err(SyncError::Settings(format!(
            "skew must be in [0, 1000000) ppm, got {}",
            options.skew_ppm
        )));
    }

    // Skew draws use their own stream so durations stay stable across skew changes.
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(1));
    let mut session = SyncSession::new(options.settings);
    let mut streams = Vec::with_capacity(options.durations.len());
    for (index, duration) in options.durations.iter().enumerate() {
        let ppm = rng.gen_range(-options.skew_ppm..=options.skew_ppm);
        let stream = SimulatedStream::new(*duration).with_skew(1.0 + ppm * 1e-6);
        info!("stream-{} duration {:.1}s skew {:+.0}ppm", index, duration, ppm);
        session.register_stream(format!("stream-{index}"), Box::new(stream.clone()))?;
        streams.push(stream);
    }

    if let Some(rate) = options.rate {
        session.set_playback_rate(rate)?;
    }
    session.play()?;

    let frame = options.settings.frame_interval();
    let frames = (options.seconds / frame.as_secs_f64()).ceil() as usize;
    let report_frames = ((options.report_every / frame.as_secs_f64()).round() as usize).max(1);
    let seek_frame = frames / 2;

    let mut summary = Summary {
        master: session.master_id().map(ToString::to_string),
        ..Summary::default()
    };
    let mut now = Instant::now();

    for index in 1..=frames {
        for stream in &streams {
            stream.advance(frame);
        }
        now += frame;
        let elapsed = index as f64 * frame.as_secs_f64();

        if index == seek_frame {
            if let Some(time) = options.seek {
                session.seek(time)?;
                let line = format!("{} seek to {:.3}s", status::format_time(elapsed), time);
                emit(&mut out, &line);
            }
        }

        let report = session.tick(now);
        summary.ticks += 1;
        summary.elapsed = elapsed;
        for follower in &report.followers {
            summary.count(follower.correction);
            summary.max_abs_drift = summary.max_abs_drift.max(follower.drift.abs());
        }
        summary.final_abs_drift = report
            .followers
            .iter()
            .map(|follower| follower.drift.abs())
            .fold(0.0, f64::max);

        for change in session.take_status_changes() {
            summary.status_changes += 1;
            emit(
                &mut out,
                &format!(
                    "{} {}: {} -> {}",
                    status::format_time(elapsed),
                    change.id,
                    change.from,
                    change.to
                ),
            );
        }

        if index % report_frames == 0 {
            if let Some(text) = status_line(&session, &report) {
                emit(&mut out, &text);
            }
        }

        if !session.is_monitoring() {
            info!("Master stopped at {:.3}s", elapsed);
            break;
        }
    }

    if summary.hard_seeks > 0 {
        warn!("{} hard seeks were needed", summary.hard_seeks);
    }
    summary.master = session.master_id().map(ToString::to_string);
    Ok(summary)
}

fn emit(out: &mut Option<&mut dyn FnMut(&str)>, line: &str) {
    if let Some(out) = out.as_mut() {
        out(line);
    }
}

fn status_line(session: &SyncSession, report: &TickReport) -> Option<String> {
    let master = session.master_id()?;
    let handle = session.handle(master)?;
    let rows: Vec<StreamRow> = report
        .followers
        .iter()
        .map(|follower| StreamRow {
            id: follower.id.to_string(),
            drift: follower.drift,
            status: follower.status,
            rate: session
                .handle(&follower.id)
                .map(|handle| handle.rate())
                .unwrap_or(1.0),
        })
        .collect();
    Some(status::status_text(StatusArgs {
        time: handle.position(),
        duration: handle.duration(),
        playing: handle.is_playing(),
        master: master.as_str(),
        master_rate: handle.rate(),
        rows: &rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(durations: &[f64]) -> SimulateOptions {
        SimulateOptions {
            durations: durations.to_vec(),
            skew_ppm: 3000.0,
            seed: 7,
            seconds: 10.0,
            seek: None,
            rate: None,
            report_every: 1.0,
            settings: SyncSettings::default(),
        }
    }

    #[test]
    fn random_durations_are_seeded() {
        assert_eq!(random_durations(4, 9), random_durations(4, 9));
        assert!(random_durations(4, 9)
            .iter()
            .all(|duration| (30.0..180.0).contains(duration)));
    }

    #[test]
    fn skewed_run_stays_out_of_hard_territory() {
        let summary = run(&options(&[120.0, 90.0, 60.0]), None).expect("run");
        assert_eq!(summary.master.as_deref(), Some("stream-0"));
        assert_eq!(summary.hard_seeks, 0);
        assert!(summary.max_abs_drift < 0.3);
        assert!(summary.ticks > 0);
    }

    #[test]
    fn run_stops_when_master_ends() {
        let mut opts = options(&[2.0, 1.5]);
        opts.seconds = 10.0;
        let summary = run(&opts, None).expect("run");
        assert!(summary.elapsed < 3.0);
    }

    #[test]
    fn progress_lines_go_to_the_sink() {
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());
        let mut opts = options(&[30.0, 30.0]);
        opts.seek = Some(5.0);
        run(&opts, Some(&mut sink as &mut dyn FnMut(&str))).expect("run");
        assert!(lines.iter().any(|line| line.contains("seek to 5.000s")));
        assert!(lines.iter().any(|line| line.contains("master stream-0")));
    }

    #[test]
    fn empty_stream_list_is_an_error() {
        assert!(run(&options(&[]), None).is_err());
    }
}
