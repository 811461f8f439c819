use clap::ArgMatches;
use log::info;
use tandem_lib::{SyncError, SyncSettings};

use crate::cli::simulate::{self, SimulateOptions};
use crate::logging::{self, LogBuffer};

pub fn run(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32, SyncError> {
    info!("Starting Tandem CLI");
    match args.subcommand() {
        Some(("simulate", sub)) => run_simulate(sub, &log_buffer),
        Some(("create", sub)) => match sub.subcommand() {
            Some(("settings-json", _)) => {
                println!("{}", SyncSettings::default().to_json_pretty()?);
                Ok(0)
            }
            _ => Ok(2),
        },
        _ => Ok(2),
    }
}

fn run_simulate(args: &ArgMatches, log_buffer: &LogBuffer) -> Result<i32, SyncError> {
    let quiet = args.get_flag("quiet");
    let as_json = args.get_flag("json");
    let log_tail = args.get_one::<usize>("log-tail").copied().unwrap_or(0);
    let options = SimulateOptions::from_matches(args)?;

    let mut print = |line: &str| println!("{}", line);
    let out: Option<&mut dyn FnMut(&str)> = if quiet || as_json {
        None
    } else {
        Some(&mut print as &mut dyn FnMut(&str))
    };
    let summary = simulate::run(&options, out)?;

    if quiet {
        return Ok(0);
    }
    if as_json {
        println!("{}", summary.to_json());
    } else {
        println!("{}", summary.to_text());
    }
    if log_tail > 0 && !as_json {
        for line in logging::tail(log_buffer, log_tail) {
            println!("{}", line);
        }
    }
    Ok(0)
}
