//! Generations and the suggestion request/result data model.

use serde::{Deserialize, Serialize};

use crate::error::UnavailableReason;
use crate::source::SourceText;
use crate::transform::Transform;

/// Monotonic sequence number, one per manipulation event.
///
/// A suggestion is only relevant while its generation is the current one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// The generation before any manipulation.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw counter value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The generation that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A layout rewrite request, immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// Generation of the manipulation that spawned this request.
    pub generation: Generation,
    /// Source text at the moment the manipulation arrived.
    pub source: SourceText,
    /// The transform produced by the manipulation.
    pub transform: Transform,
}

/// What the suggestion service produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    /// A relative-layout rewrite of the component.
    Rewritten(SourceText),
    /// No rewrite could be obtained.
    Unavailable(UnavailableReason),
}

impl SuggestionOutcome {
    /// Whether a rewrite was produced.
    #[must_use]
    pub const fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Rewritten(_) => "rewritten",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// An outcome tagged with the generation that requested it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResult {
    /// Generation of the originating request.
    pub generation: Generation,
    /// The outcome.
    pub outcome: SuggestionOutcome,
}

impl SuggestionResult {
    /// Pair an outcome with its request's generation.
    #[must_use]
    pub fn for_request(request: &SuggestionRequest, outcome: SuggestionOutcome) -> Self {
        Self {
            generation: request.generation,
            outcome,
        }
    }
}
