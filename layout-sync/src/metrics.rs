//! Metrics for sync sessions.
//!
//! Recording is a no-op until the host installs a `metrics` recorder.

use metrics::{counter, gauge};

use crate::event::{CommitOrigin, SyncEvent};

// Metric names as constants for consistency
const MANIPULATIONS_TOTAL: &str = "layout_manipulations_total";
const COMMITS_TOTAL: &str = "layout_commits_total";
const SUGGESTIONS_TOTAL: &str = "layout_suggestions_total";
const STALE_SUGGESTIONS_TOTAL: &str = "layout_stale_suggestions_total";
const PATCH_NOT_APPLIED_TOTAL: &str = "layout_patch_not_applied_total";
const RENDER_FAILURES_TOTAL: &str = "layout_render_failures_total";
const SUGGESTIONS_IN_FLIGHT: &str = "layout_suggestions_in_flight";

/// Record a manipulation.
///
/// # Arguments
///
/// * `kind` - "drag" or "resize"
pub fn record_manipulation(kind: &'static str) {
    counter!(MANIPULATIONS_TOTAL, "kind" => kind).increment(1);
}

/// Update the number of unresolved suggestion requests.
#[allow(clippy::cast_precision_loss)]
pub fn set_suggestions_in_flight(count: usize) {
    gauge!(SUGGESTIONS_IN_FLIGHT).set(count as f64);
}

/// Record whatever `event` says about the session.
pub fn observe(event: &SyncEvent) {
    match event {
        SyncEvent::Committed { origin, .. } => {
            counter!(COMMITS_TOTAL, "origin" => origin.label()).increment(1);
            if *origin == CommitOrigin::Suggestion {
                counter!(SUGGESTIONS_TOTAL, "outcome" => "rewritten").increment(1);
            }
        }
        SyncEvent::PatchNotApplied { .. } => counter!(PATCH_NOT_APPLIED_TOTAL).increment(1),
        SyncEvent::TransformChanged { .. }
        | SyncEvent::SuggestionRequested { .. }
        | SyncEvent::Rendered { .. } => {}
        SyncEvent::SuggestionUnchanged { .. } => {
            counter!(SUGGESTIONS_TOTAL, "outcome" => "unchanged").increment(1);
        }
        SyncEvent::SuggestionUnavailable { .. } => {
            counter!(SUGGESTIONS_TOTAL, "outcome" => "unavailable").increment(1);
        }
        SyncEvent::StaleSuggestionDiscarded { .. } => {
            counter!(STALE_SUGGESTIONS_TOTAL).increment(1);
        }
        SyncEvent::SuggestionRolledBack { .. } => {
            counter!(SUGGESTIONS_TOTAL, "outcome" => "rolled_back").increment(1);
        }
        SyncEvent::RenderFailed { .. } => counter!(RENDER_FAILURES_TOTAL).increment(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_core::{Generation, SourceText};

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_manipulation("drag");
        set_suggestions_in_flight(2);
        observe(&SyncEvent::Committed {
            revision: 1,
            origin: CommitOrigin::Suggestion,
            generation: Generation::new(1),
            source: SourceText::from("x"),
        });
        observe(&SyncEvent::SuggestionUnchanged {
            generation: Generation::new(1),
        });
        observe(&SyncEvent::StaleSuggestionDiscarded {
            generation: Generation::new(1),
            current: Generation::new(2),
        });
    }
}
