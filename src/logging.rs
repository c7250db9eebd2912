//! Logging initialization.
//!
//! The terminal belongs to the UI while it runs, so log output only ever goes
//! to a file.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{Config, ConfigBuilder, WriteLogger};

/// Install a file logger at `path`.
///
/// A log file that can't be created is not fatal: the app runs without
/// logging and says so on stderr before the UI takes over.
pub fn initialize(path: &Path, level: LevelFilter) {
    let file = match File::create(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: Could not create log file at {path:?}: {err}");
            return;
        }
    };
    let _ = WriteLogger::init(level, build_config(), file);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        // Keep HTTP stack chatter out of the app log.
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build()
}
