//! Text rendering for simulation progress.

use tandem_lib::SyncStatus;

/// One follower's line in a status report.
pub struct StreamRow {
    pub id: String,
    pub drift: f64,
    pub status: SyncStatus,
    pub rate: f64,
}

pub struct StatusArgs<'a> {
    pub time: f64,
    pub duration: f64,
    pub playing: bool,
    pub master: &'a str,
    pub master_rate: f64,
    pub rows: &'a [StreamRow],
}

pub fn status_text(args: StatusArgs<'_>) -> String {
    let state = if args.playing { "▶" } else { "⏸" };
    let percent = if args.duration > 0.0 {
        (args.time / args.duration * 100.0).min(100.0)
    } else {
        0.0
    };
    let mut text = format!(
        "{} {} / {} ({:>5.1}%)  master {} {:.3}x",
        state,
        format_time(args.time),
        format_time(args.duration),
        percent,
        args.master,
        args.master_rate
    );
    for row in args.rows {
        text.push_str(&format!(
            "\n    {:<12} {:>+8.3}s  {:<8} {:.3}x",
            row.id,
            row.drift,
            row.status.to_string(),
            row.rate
        ));
    }
    text
}

/// `HH:MM:SS` for a time in seconds, rounded up.
pub fn format_time(time: f64) -> String {
    let seconds = time.max(0.0).ceil() as u64;
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_rounds_up() {
        assert_eq!(format_time(0.0), "00:00:00");
        assert_eq!(format_time(59.2), "00:01:00");
        assert_eq!(format_time(3725.0), "01:02:05");
    }

    #[test]
    fn status_lists_each_follower() {
        let rows = vec![
            StreamRow {
                id: "stream-1".to_string(),
                drift: 0.12,
                status: SyncStatus::Tuning,
                rate: 0.95,
            },
            StreamRow {
                id: "stream-2".to_string(),
                drift: -0.01,
                status: SyncStatus::Synced,
                rate: 1.0,
            },
        ];
        let text = status_text(StatusArgs {
            time: 30.0,
            duration: 120.0,
            playing: true,
            master: "stream-0",
            master_rate: 1.0,
            rows: &rows,
        });
        assert!(text.starts_with("▶ 00:00:30 / 00:02:00 ( 25.0%)  master stream-0"));
        assert!(text.contains("+0.120s  tuning"));
        assert!(text.contains("-0.010s  synced"));
        assert_eq!(text.lines().count(), 3);
    }
}
