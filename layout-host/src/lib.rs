//! # Live Layout Host
//!
//! Headless driver for a sync session over newline-delimited JSON.
//!
//! ## Protocol
//!
//! Commands arrive one per line on stdin:
//!
//! ```text
//! {"type":"edit","text":"<component source>"}
//! {"type":"drag","x":40,"y":60}
//! {"type":"resize","width":300,"height":150,"x":10,"y":20,"bounds":{"width":800,"height":600}}
//! {"type":"snapshot"}
//! ```
//!
//! Every session event is written to stdout as one JSON line, followed by
//! `{"type":"render",...}` lines from the render pipeline and
//! `{"type":"snapshot",...}` lines on request and at exit.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use layout_core::{Bounds, ManipulationEvent, RenderError, RenderPipeline, SourceText};
use layout_sync::{SessionSnapshot, SyncConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command-line arguments for layout-host.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "layout-host")]
#[command(about = "Drive a Live Layout sync session over JSON lines")]
#[command(version)]
pub struct CliArgs {
    /// Component source to start from (default: built-in Hello World)
    pub source: Option<PathBuf>,

    /// Credential for the layout suggestion service
    #[arg(long, env = "LAYOUT_ADVISOR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Suggestion service base URL (e.g., <https://api.openai.com/v1>)
    #[arg(long, env = "LAYOUT_ADVISOR_URL")]
    pub advisor_url: Option<String>,

    /// Suggestion model name
    #[arg(long, env = "LAYOUT_ADVISOR_MODEL")]
    pub model: Option<String>,

    /// Quiet period in milliseconds before a manual edit commits
    #[arg(long, env = "LAYOUT_DEBOUNCE_MS")]
    pub debounce_ms: Option<u64>,

    /// Upper bound in milliseconds on a single suggestion request
    #[arg(long, env = "LAYOUT_SUGGESTION_TIMEOUT_MS")]
    pub suggestion_timeout_ms: Option<u64>,
}

impl CliArgs {
    /// Apply the arguments that were given on top of `base`.
    #[must_use]
    pub fn apply_to(&self, mut base: SyncConfig) -> SyncConfig {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            base.advisor.api_key = Some(key.clone());
        }
        if let Some(url) = &self.advisor_url {
            base.advisor.base_url.clone_from(url);
        }
        if let Some(model) = &self.model {
            base.advisor.model.clone_from(model);
        }
        if let Some(ms) = self.debounce_ms {
            base.debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = self.suggestion_timeout_ms {
            base.suggestion_timeout = Duration::from_millis(ms);
        }
        base
    }
}

/// Errors from host input handling.
#[derive(Debug, Error)]
pub enum HostError {
    /// A stdin line was not a valid command.
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] serde_json::Error),

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// A command read from stdin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// A keystroke-level edit carrying the whole text.
    Edit {
        /// Full editor contents.
        text: String,
    },
    /// A finished drag.
    Drag {
        /// Resulting left offset.
        x: f64,
        /// Resulting top offset.
        y: f64,
        /// Parent box, when known.
        #[serde(default)]
        bounds: Option<Bounds>,
    },
    /// A finished resize.
    Resize {
        /// Resulting width.
        width: f64,
        /// Resulting height.
        height: f64,
        /// Resulting left offset.
        #[serde(default)]
        x: f64,
        /// Resulting top offset.
        #[serde(default)]
        y: f64,
        /// Parent box, when known.
        #[serde(default)]
        bounds: Option<Bounds>,
    },
    /// Print the current session state.
    Snapshot,
}

/// What the host does with a command.
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    /// Forward a keystroke-level edit.
    Edit(SourceText),
    /// Forward a finished manipulation.
    Manipulate(ManipulationEvent),
    /// Print the current session state.
    Snapshot,
}

impl HostCommand {
    /// Resolve the command into the action the host performs.
    #[must_use]
    pub fn into_action(self) -> HostAction {
        let (event, bounds) = match self {
            Self::Edit { text } => return HostAction::Edit(SourceText::from(text)),
            Self::Snapshot => return HostAction::Snapshot,
            Self::Drag { x, y, bounds } => (ManipulationEvent::drag(x, y), bounds),
            Self::Resize {
                width,
                height,
                x,
                y,
                bounds,
            } => (ManipulationEvent::resize(width, height, x, y), bounds),
        };
        HostAction::Manipulate(match bounds {
            Some(bounds) => event.within(bounds),
            None => event,
        })
    }
}

/// Parse one stdin line; blank lines yield `None`.
///
/// # Errors
///
/// Returns [`HostError::InvalidCommand`] for anything that is not a command.
pub fn parse_command(line: &str) -> Result<Option<HostCommand>, HostError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// A host-originated output line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostOutput<'a> {
    /// Text handed to the render pipeline.
    Render {
        /// The rendered source.
        source: &'a SourceText,
    },
    /// Session state.
    Snapshot(&'a SessionSnapshot),
}

/// Write `value` as a single JSON line.
///
/// The line is serialized up front and handed to `out` in one `write_all`,
/// so writers that lock per call (such as [`std::io::Stdout`]) never
/// interleave it with lines from other threads.
///
/// # Errors
///
/// Returns [`HostError`] if serialization or the write fails.
pub fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), HostError> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    out.write_all(&line)?;
    out.flush()?;
    Ok(())
}

/// Render pipeline that reports each committed source as a `render` line.
#[derive(Debug)]
pub struct LinePipeline<W> {
    out: W,
}

impl<W: Write> LinePipeline<W> {
    /// Create a pipeline writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RenderPipeline for LinePipeline<W> {
    fn render(&mut self, source: &SourceText) -> Result<(), RenderError> {
        if source.as_str().trim().is_empty() {
            return Err(RenderError::new("nothing to render"));
        }
        write_line(&mut self.out, &HostOutput::Render { source })
            .map_err(|e| RenderError::new(e.to_string()))
    }
}
