//! Logger setup: terminal plus an optional log file

use std::fs::{self, OpenOptions};
use std::path::Path;

use log::{info, warn, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Map a `-v` count to a level filter
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialise logging to the terminal and, when given, appending to `log_file`
///
/// If the log file cannot be opened, logging continues on the terminal only
/// and a warning says why. Calling this twice keeps the first logger.
pub fn init(level: LevelFilter, log_file: Option<&Path>) {
    let term_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        term_config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let mut file_error = None;
    if let Some(path) = log_file {
        let opened = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(path));
        match opened {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => file_error = Some(e),
        }
    }

    // We ignore the result here as a logger may already be installed
    let _ = CombinedLogger::init(loggers);

    match (log_file, file_error) {
        (Some(path), Some(e)) => warn!(
            "Could not open log file {}: {}. Using console logging only.",
            path.display(),
            e
        ),
        (Some(path), None) => info!("Logging to {}", path.display()),
        _ => (),
    }
}
