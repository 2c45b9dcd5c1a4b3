//! # Debounced Edit Channel
//!
//! Coalesces bursts of manual edits into a single commit.
//!
//! ```text
//! edit "a" ─┐
//! edit "ab" ┼─ each edit pushes the deadline to `at + interval`
//! edit "abc"┘
//!            ···· quiet for `interval` ····▶ commit "abc"
//! ```
//!
//! The debouncer only tracks the pending text and its deadline; the session
//! actor sleeps until [`EditDebouncer::deadline`] and then calls
//! [`EditDebouncer::take_due`].

use std::time::Duration;

use layout_core::SourceText;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct PendingEdit {
    text: SourceText,
    deadline: Instant,
    coalesced: usize,
}

/// Holds the latest uncommitted manual edit.
#[derive(Debug)]
pub struct EditDebouncer {
    interval: Duration,
    pending: Option<PendingEdit>,
}

impl EditDebouncer {
    /// Create a debouncer with the given quiet interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    /// Record a keystroke made at `at`, replacing any pending text.
    ///
    /// A pending edit whose deadline had already passed at `at` is not
    /// coalesced; it is returned so the caller can commit it first.
    #[must_use = "a displaced due edit must still be committed"]
    pub fn on_manual_edit(&mut self, text: SourceText, at: Instant) -> Option<SourceText> {
        let due = self.take_due(at);
        let coalesced = self.pending.as_ref().map_or(0, |p| p.coalesced + 1);
        self.pending = Some(PendingEdit {
            text,
            deadline: at + self.interval,
            coalesced,
        });
        due
    }

    /// When the pending edit becomes due, if there is one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Whether an edit is waiting for its quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending text if its deadline has passed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<SourceText> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Take the pending text regardless of its deadline.
    pub fn flush(&mut self) -> Option<SourceText> {
        self.pending.take().map(|p| {
            if p.coalesced > 0 {
                tracing::trace!(coalesced = p.coalesced, "coalesced manual edits");
            }
            p.text
        })
    }
}
