use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::version;

#[derive(Parser)]
#[command(author, version = version(), about, long_about = None)]
#[command(subcommand_value_name = "SUBCOMMAND")]
#[command(subcommand_help_heading = "Subcommands")]
pub struct Cli {
    /// Path to config file (default: `$XDG_CONFIG_HOME/tapestry/config.kdl`).
    ///
    /// This can also be set with the `TAPESTRY_CONFIG` environment variable. If both are set, the
    /// command line argument takes precedence.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: Sub,
}

#[derive(Subcommand)]
pub enum Sub {
    /// Replay recorded contact events and print everything recognized as JSON lines.
    Replay {
        /// File with one JSON contact event per line (default: stdin).
        ///
        /// Every event carries an `at_ms` offset from the start of the recording.
        file: Option<PathBuf>,
        /// Wait for each event offset on the event loop instead of using a virtual clock.
        #[arg(long)]
        realtime: bool,
    },
    /// Validate the config file.
    Validate,
}
