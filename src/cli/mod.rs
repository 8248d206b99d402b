//! CLI command handling
//!
//! Replays recorded event streams and formats the resulting summary.

use std::path::Path;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::commands::Commands;
use crate::common::{config::Config, paths, Error, Result};
use crate::driver::Summary;
use crate::event::{Event, EventSender};
use crate::listener::TracingListener;
use crate::session;

/// Dispatch a CLI command
///
/// Returns `false` when the replayed run had failures or was cancelled.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Replay {
            file,
            config,
            verbose,
        } => {
            let mut config = match &config {
                Some(path) => Config::load_from(path)?,
                None => Config::load()?,
            };
            if verbose {
                config.options = config.options.with("verbose", true);
            }

            let summary = replay(file.as_deref(), &config).await?;
            print_summary(&summary);
            Ok(summary.is_clean())
        }

        Commands::ConfigPath => {
            match paths::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No configuration directory available"),
            }
            Ok(true)
        }
    }
}

/// Feed an event file (or stdin) to a session and wait for its summary
async fn replay(file: Option<&Path>, config: &Config) -> Result<Summary> {
    let (sender, handle) = session::start_with_config(TracingListener::new(), config);

    let fed = match file {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            feed(BufReader::new(file), &sender).await
        }
        None => feed(BufReader::new(tokio::io::stdin()), &sender).await,
    };

    // Closing the stream lets the worker notice a truncated recording
    drop(sender);
    let count = fed?;
    tracing::debug!(events = count, "Event stream fully sent");

    handle.join().await
}

/// Send each JSON line as an event; returns the number sent
async fn feed<R>(reader: R, sender: &EventSender) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut count = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: Event = serde_json::from_str(line).map_err(|e| Error::InvalidEvent {
            line: line_no,
            error: e.to_string(),
        })?;

        if !sender.send(event) {
            tracing::warn!(line = line_no, "Session stopped before the stream ended");
            break;
        }
        count += 1;
    }

    Ok(count)
}

fn print_summary(summary: &Summary) {
    println!("\n{}", "Summary:".blue().bold());
    println!("  {} {}", "passed: ".green(), summary.success);
    println!("  {} {}", "failed: ".red(), summary.fail);
    println!("  {} {}", "skipped:".yellow(), summary.skipped);
    if summary.cancel {
        println!("  {}", "run was cancelled".red().bold());
    }

    if summary.is_clean() {
        println!("\n{} {} tests\n", "✓".green().bold(), summary.total());
    } else {
        println!("\n{} {} tests\n", "✗".red().bold(), summary.total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{NodeId, Phase};

    #[tokio::test]
    async fn test_feed_skips_blank_and_comment_lines() {
        let input = b"# recorded run\n\n{\"id\":[1],\"phase\":\"cancel\",\"reason\":\"x\"}\n".to_vec();
        let (sender, mut rx) = EventSender::channel();

        let count = feed(BufReader::new(&input[..]), &sender).await.unwrap();
        assert_eq!(count, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.id, NodeId::from([1]));
        assert!(matches!(event.phase, Phase::Cancel { .. }));
    }

    #[tokio::test]
    async fn test_feed_reports_bad_line_number() {
        let input = b"{\"id\":[],\"phase\":\"cancel\"}\nnot json\n".to_vec();
        let (sender, _rx) = EventSender::channel();

        let err = feed(BufReader::new(&input[..]), &sender).await.unwrap_err();
        assert!(matches!(err, Error::InvalidEvent { line: 2, .. }));
    }
}
