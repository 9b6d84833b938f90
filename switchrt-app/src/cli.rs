use std::path::PathBuf;

use clap::{ArgAction, Parser};
use switchrt_experiment::Route;

use crate::logging::LogFormat;

/// Colour/number task-switching reaction-time experiment.
#[derive(Parser, Debug)]
#[command(name = "switchrt", version, about)]
pub struct Cli {
    /// Participant email. Required unless exporting.
    #[arg(long, env = "SWITCHRT_EMAIL")]
    pub email: Option<String>,

    /// Route to enter: `trial` (practice) or `game` (full test).
    #[arg(long, default_value = "trial")]
    pub route: Route,

    /// JSON document holding participants and submitted sessions.
    #[arg(long, default_value = "switchrt_results.json", env = "SWITCHRT_RESULTS")]
    pub results: PathBuf,

    /// JSON file overriding timing and iteration defaults.
    #[arg(short, long, env = "SWITCHRT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write every stored session as CSV to this path (`-` for stdout) and exit.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Open a window instead of going full screen.
    #[arg(long)]
    pub windowed: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}
