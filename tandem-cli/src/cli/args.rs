//! CLI argument definitions for `tandem-cli`.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("Tandem")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Simulate synchronized playback of independently clocked streams")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run simulated streams through the sync controller in virtual time")
                .arg(
                    Arg::new("streams")
                        .long("streams")
                        .short('n')
                        .value_name("COUNT")
                        .value_parser(value_parser!(usize))
                        .default_value("3")
                        .conflicts_with("durations")
                        .help("Number of streams with random durations"),
                )
                .arg(
                    Arg::new("durations")
                        .long("durations")
                        .value_name("SECONDS,...")
                        .value_delimiter(',')
                        .value_parser(value_parser!(f64))
                        .help("Comma separated stream durations in seconds"),
                )
                .arg(
                    Arg::new("skew-ppm")
                        .long("skew-ppm")
                        .value_name("PPM")
                        .value_parser(value_parser!(f64))
                        .default_value("2000")
                        .help("Largest clock error per stream, in parts per million"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("SEED")
                        .value_parser(value_parser!(u64))
                        .default_value("42")
                        .help("Seed for durations and clock skew"),
                )
                .arg(
                    Arg::new("seconds")
                        .long("seconds")
                        .short('t')
                        .value_name("SECONDS")
                        .value_parser(value_parser!(f64))
                        .default_value("20")
                        .help("Virtual time to simulate"),
                )
                .arg(
                    Arg::new("seek")
                        .long("seek")
                        .short('s')
                        .value_name("TIME")
                        .value_parser(value_parser!(f64))
                        .help("Seek every stream to TIME halfway through the run"),
                )
                .arg(
                    Arg::new("rate")
                        .long("rate")
                        .short('r')
                        .value_name("RATE")
                        .value_parser(value_parser!(f64))
                        .help("Playback rate applied before starting"),
                )
                .arg(
                    Arg::new("settings")
                        .long("settings")
                        .value_name("PATH")
                        .help("Path to a sync settings JSON file"),
                )
                .arg(
                    Arg::new("report-every")
                        .long("report-every")
                        .value_name("SECONDS")
                        .value_parser(value_parser!(f64))
                        .default_value("1")
                        .help("Interval between status lines"),
                )
                .arg(
                    Arg::new("log-tail")
                        .long("log-tail")
                        .value_name("LINES")
                        .value_parser(value_parser!(usize))
                        .default_value("0")
                        .help("Print the last LINES log lines after the run"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run summary as JSON"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Suppress all console output"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("settings-json").about("Print the default sync settings JSON"),
                ),
        )
}
