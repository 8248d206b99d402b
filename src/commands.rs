//! CLI command definitions
//!
//! Defines the clap commands for the test-listener CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a recorded JSON-lines event stream through the tracing listener
    Replay {
        /// Event file to read (default: stdin)
        file: Option<PathBuf>,

        /// Configuration file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log every begin at INFO level
        #[arg(long, short)]
        verbose: bool,
    },

    /// Print the configuration file path that would be loaded
    ConfigPath,
}
