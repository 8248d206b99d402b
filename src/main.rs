//! Test listener CLI
//!
//! Replays recorded test-run event streams through a listener session.

use clap::Parser;
use test_listener::{cli, commands, common::logging};
use commands::Commands;

#[derive(Parser)]
#[command(name = "test-listener", about = "Replay hierarchical test-run events")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
