//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

use crate::poll::PollSettings;

#[derive(Debug, Parser, Clone)]
#[command(name = "car-tracker-tui")]
#[command(about = "Terminal front end for a car-tracker backend")]
pub struct Config {
    /// Backend base URL, e.g. http://localhost:5000
    #[arg(long, env = "CAR_TRACKER_URL", default_value = "http://localhost:5000")]
    pub base_url: String,
    /// Milliseconds between two status polls of one ingestion task.
    #[arg(
        long,
        env = "CAR_TRACKER_POLL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,
    /// Milliseconds to wait after a task completes before reloading the list.
    #[arg(long, env = "CAR_TRACKER_REFRESH_DELAY_MS", default_value_t = 2000)]
    pub refresh_delay_ms: u64,
    /// Where log output goes.  The terminal is owned by the UI.
    #[arg(long, env = "CAR_TRACKER_LOG", default_value = "car-tracker.log")]
    pub log_file: PathBuf,
    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            refresh_delay: Duration::from_millis(self.refresh_delay_ms),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
