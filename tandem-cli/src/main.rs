//! # Tandem
//!
//! Drives simulated multi-stream playback through the sync controller and
//! reports how drift is held in check.

use log::error;

mod cli;
mod logging;
mod runner;
mod status;

fn main() {
    dotenv::dotenv().ok();
    let log_buffer = logging::init();
    let args = cli::args::build_cli().get_matches();

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err.to_string().to_lowercase());
            1
        }
    };

    std::process::exit(code)
}
