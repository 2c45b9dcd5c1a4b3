//! Events emitted by a sync session.

use layout_core::{Generation, SourceText, Transform, UnavailableReason};
use serde::{Deserialize, Serialize};

/// What caused a commit of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOrigin {
    /// The initial definition at session start.
    Initial,
    /// A debounced manual edit.
    ManualEdit,
    /// The deterministic patch applied on a manipulation.
    Deterministic,
    /// An accepted layout suggestion.
    Suggestion,
    /// A suggestion that failed to render, replaced by its deterministic text.
    Rollback,
}

impl CommitOrigin {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::ManualEdit => "manual_edit",
            Self::Deterministic => "deterministic",
            Self::Suggestion => "suggestion",
            Self::Rollback => "rollback",
        }
    }
}

/// Observable outcome of a session step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// New source text became authoritative.
    Committed {
        /// Commit counter, increasing by one per commit.
        revision: u64,
        /// What produced the text.
        origin: CommitOrigin,
        /// Generation current at commit time.
        generation: Generation,
        /// The committed text.
        source: SourceText,
    },
    /// The visual transform changed.
    TransformChanged {
        /// Generation current at the change.
        generation: Generation,
        /// The new transform.
        transform: Transform,
    },
    /// A manipulation found no style declaration to rewrite.
    PatchNotApplied {
        /// The manipulation's generation.
        generation: Generation,
    },
    /// A layout suggestion was requested.
    SuggestionRequested {
        /// The manipulation's generation.
        generation: Generation,
    },
    /// A current suggestion matched the committed text; nothing was committed.
    SuggestionUnchanged {
        /// The manipulation's generation.
        generation: Generation,
    },
    /// A current suggestion could not be obtained; the deterministic text stands.
    SuggestionUnavailable {
        /// The manipulation's generation.
        generation: Generation,
        /// Why.
        reason: UnavailableReason,
    },
    /// A suggestion arrived after it stopped being relevant.
    StaleSuggestionDiscarded {
        /// The suggestion's generation.
        generation: Generation,
        /// The generation current on arrival.
        current: Generation,
    },
    /// An accepted suggestion failed to render and was replaced.
    SuggestionRolledBack {
        /// The suggestion's generation.
        generation: Generation,
        /// The render failure that triggered the rollback.
        message: String,
    },
    /// The render pipeline accepted a revision.
    Rendered {
        /// The rendered revision.
        revision: u64,
    },
    /// The render pipeline rejected a revision.
    RenderFailed {
        /// The rejected revision.
        revision: u64,
        /// Message for display.
        message: String,
    },
}

impl SyncEvent {
    /// Event name as it appears in the serialized `type` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Committed { .. } => "committed",
            Self::TransformChanged { .. } => "transform_changed",
            Self::PatchNotApplied { .. } => "patch_not_applied",
            Self::SuggestionRequested { .. } => "suggestion_requested",
            Self::SuggestionUnchanged { .. } => "suggestion_unchanged",
            Self::SuggestionUnavailable { .. } => "suggestion_unavailable",
            Self::StaleSuggestionDiscarded { .. } => "stale_suggestion_discarded",
            Self::SuggestionRolledBack { .. } => "suggestion_rolled_back",
            Self::Rendered { .. } => "rendered",
            Self::RenderFailed { .. } => "render_failed",
        }
    }
}
