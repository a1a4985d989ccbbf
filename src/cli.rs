use clap::Parser;
use std::path::PathBuf;

// Build version with runtime info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Dispatch: synchronous, single-threaded\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Replay container/media-control event scripts
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// JSON script to replay (runs the built-in demo session if omitted)
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Pretty-print step reports instead of one JSON object per line
    #[arg(short = 'p', long = "pretty")]
    pub pretty: bool,

    /// Enable logging to file (default: mediabus.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Dispatch config file (JSON); overrides MEDIABUS_CONFIG
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}
