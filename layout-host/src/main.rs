//! # Live Layout Host
//!
//! Reads commands from stdin, drives one sync session and writes its events
//! to stdout. Logs go to stderr.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use layout_core::SourceText;
use layout_host::{parse_command, write_line, CliArgs, HostAction, HostOutput, LinePipeline};
use layout_sync::{SessionHandle, SyncConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Poll interval while waiting for the last suggestion before exit.
const SETTLE_POLL: Duration = Duration::from_millis(50);

/// Initialize structured tracing on stderr with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,layout_sync=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,layout_sync=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = args.apply_to(SyncConfig::from_env());
    tracing::info!(
        debounce_ms = config.debounce.as_millis(),
        suggestions = config.advisor.has_credential(),
        "Starting Live Layout host"
    );

    let initial = match &args.source {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            SourceText::from(text)
        }
        None => SourceText::default_component(),
    };

    let (session, mut events) =
        SessionHandle::connect(&config, initial, LinePipeline::new(std::io::stdout()))?;

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = write_line(&mut std::io::stdout().lock(), &event) {
                        tracing::warn!("failed to write event: {e}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("skipping input line: {e}");
                continue;
            }
        };

        match command.into_action() {
            HostAction::Edit(text) => session.manual_edit(text)?,
            HostAction::Manipulate(event) => session.manipulate(event)?,
            HostAction::Snapshot => {
                let snapshot = session.snapshot().await?;
                write_line(&mut std::io::stdout().lock(), &HostOutput::Snapshot(&snapshot))?;
            }
        }
    }

    // let the current suggestion land; the request itself is time-bounded
    while session.snapshot().await?.suggestion_pending {
        tokio::time::sleep(SETTLE_POLL).await;
    }

    let snapshot = session.shutdown().await?;
    printer.await.context("event printer failed")?;
    write_line(&mut std::io::stdout().lock(), &HostOutput::Snapshot(&snapshot))?;

    tracing::info!(revision = snapshot.revision, "Live Layout host finished");
    Ok(())
}
