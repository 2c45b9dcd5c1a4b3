//! # Sync Engine
//!
//! Single owner of the authoritative source text. Inputs arrive as method
//! calls; every call returns the [`Effect`]s the caller must carry out.
//!
//! ## Arbitration
//!
//! ```text
//! manipulation ──▶ generation += 1
//!                  ├─ deterministic patch, committed now (provisional)
//!                  └─ SuggestionRequest { generation }
//!
//! suggestion(g) ──▶ g != current or superseded ──▶ discard (stale)
//!                   Rewritten                  ──▶ commit rewrite
//!                   Unavailable                ──▶ provisional text stays
//! ```
//!
//! Results are ordered by generation validity, never by completion order.

use layout_core::{
    apply_transform, derive_transform, read_transform, Generation, ManipulationEvent,
    RenderError, SourceText, SuggestionOutcome, SuggestionRequest, SuggestionResult, Transform,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::event::{CommitOrigin, SyncEvent};

/// Work requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Render `source` and report back through [`SyncEngine::render_finished`].
    Render {
        /// Revision being rendered.
        revision: u64,
        /// The committed text.
        source: SourceText,
    },
    /// Issue a suggestion request and report back through
    /// [`SyncEngine::resolve_suggestion`].
    RequestSuggestion(SuggestionRequest),
    /// Publish an event.
    Notify(SyncEvent),
}

/// Point-in-time view of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Committed source text.
    pub source: SourceText,
    /// Current visual transform.
    pub transform: Transform,
    /// Current generation.
    pub generation: Generation,
    /// Current revision.
    pub revision: u64,
    /// Whether the current generation still awaits its suggestion.
    pub suggestion_pending: bool,
    /// Last render failure, cleared by the next successful render.
    pub render_error: Option<RenderError>,
}

/// The synchronization state machine.
#[derive(Debug)]
pub struct SyncEngine {
    source: SourceText,
    transform: Transform,
    generation: Generation,
    revision: u64,
    last_origin: CommitOrigin,
    /// Deterministic text of the current generation, kept as rollback target.
    provisional: Option<SourceText>,
    /// Generation whose suggestion may still be applied.
    awaiting: Option<Generation>,
    in_flight: usize,
    render_error: Option<RenderError>,
    last_rendered: Option<SourceText>,
}

impl SyncEngine {
    /// Create an engine over `initial`.
    ///
    /// The visual transform is read from the source's style declaration,
    /// falling back to [`Transform::default`].
    #[must_use]
    pub fn new(initial: SourceText) -> Self {
        let transform = read_transform(&initial).unwrap_or_default();
        Self {
            source: initial,
            transform,
            generation: Generation::ZERO,
            revision: 0,
            last_origin: CommitOrigin::Initial,
            provisional: None,
            awaiting: None,
            in_flight: 0,
            render_error: None,
            last_rendered: None,
        }
    }

    /// Announce the initial text and request its first render.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::Notify(SyncEvent::TransformChanged {
            generation: self.generation,
            transform: self.transform,
        })];
        self.commit(self.source.clone(), CommitOrigin::Initial, &mut effects);
        effects
    }

    /// Commit a debounced manual edit.
    ///
    /// Supersedes any suggestion still pending for the current generation,
    /// and follows the style declaration back into the visual transform.
    pub fn commit_edit(&mut self, text: SourceText) -> Vec<Effect> {
        let mut effects = Vec::new();

        if let Some(generation) = self.awaiting.take() {
            debug!(%generation, "manual edit supersedes pending suggestion");
        }
        self.provisional = None;

        if let Some(transform) = read_transform(&text) {
            if transform != self.transform {
                self.transform = transform;
                effects.push(Effect::Notify(SyncEvent::TransformChanged {
                    generation: self.generation,
                    transform,
                }));
            }
        }

        self.commit(text, CommitOrigin::ManualEdit, &mut effects);
        effects
    }

    /// Apply a drag or resize.
    ///
    /// Bumps the generation, commits the deterministic patch immediately and
    /// requests exactly one suggestion for the new generation.
    pub fn manipulate(&mut self, event: &ManipulationEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        self.generation = self.generation.next();
        let generation = self.generation;
        let requested_from = self.source.clone();

        self.transform = derive_transform(event, &self.transform);
        debug!(
            %generation,
            kind = event.label(),
            transform = %self.transform,
            "manipulation"
        );
        effects.push(Effect::Notify(SyncEvent::TransformChanged {
            generation,
            transform: self.transform,
        }));

        match apply_transform(&self.source, &self.transform) {
            Ok(patched) => {
                self.provisional = Some(patched.clone());
                self.commit(patched, CommitOrigin::Deterministic, &mut effects);
            }
            Err(err) => {
                warn!(%generation, error = %err, "deterministic patch not applied");
                self.provisional = Some(self.source.clone());
                effects.push(Effect::Notify(SyncEvent::PatchNotApplied { generation }));
            }
        }

        self.awaiting = Some(generation);
        self.in_flight += 1;
        effects.push(Effect::RequestSuggestion(SuggestionRequest {
            generation,
            source: requested_from,
            transform: self.transform,
        }));
        effects.push(Effect::Notify(SyncEvent::SuggestionRequested { generation }));
        effects
    }

    /// Arbitrate an arriving suggestion.
    pub fn resolve_suggestion(&mut self, result: SuggestionResult) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.in_flight = self.in_flight.saturating_sub(1);

        let SuggestionResult {
            generation,
            outcome,
        } = result;

        if generation != self.generation || self.awaiting != Some(generation) {
            debug!(
                %generation,
                current = %self.generation,
                outcome = outcome.label(),
                "discarding stale suggestion"
            );
            effects.push(Effect::Notify(SyncEvent::StaleSuggestionDiscarded {
                generation,
                current: self.generation,
            }));
            return effects;
        }
        self.awaiting = None;

        match outcome {
            SuggestionOutcome::Rewritten(text) => {
                if text == self.source {
                    debug!(%generation, "suggestion identical to committed text");
                    self.provisional = None;
                    effects.push(Effect::Notify(SyncEvent::SuggestionUnchanged { generation }));
                } else {
                    self.commit(text, CommitOrigin::Suggestion, &mut effects);
                }
            }
            SuggestionOutcome::Unavailable(reason) => {
                info!(%generation, %reason, "keeping deterministic text");
                self.provisional = None;
                effects.push(Effect::Notify(SyncEvent::SuggestionUnavailable {
                    generation,
                    reason,
                }));
            }
        }
        effects
    }

    /// Record the render outcome for `revision`.
    ///
    /// A failed render of an accepted suggestion rolls back to that
    /// generation's deterministic text.
    pub fn render_finished(
        &mut self,
        revision: u64,
        result: Result<(), RenderError>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if revision != self.revision {
            debug!(revision, current = self.revision, "ignoring outdated render report");
            return effects;
        }

        match result {
            Ok(()) => {
                self.render_error = None;
                self.last_rendered = Some(self.source.clone());
                effects.push(Effect::Notify(SyncEvent::Rendered { revision }));
            }
            Err(err) => {
                warn!(revision, error = %err, "render failed");
                effects.push(Effect::Notify(SyncEvent::RenderFailed {
                    revision,
                    message: err.message.clone(),
                }));

                if self.last_origin == CommitOrigin::Suggestion {
                    if let Some(fallback) = self.provisional.take() {
                        warn!(generation = %self.generation, "rolling back unrenderable suggestion");
                        effects.push(Effect::Notify(SyncEvent::SuggestionRolledBack {
                            generation: self.generation,
                            message: err.message.clone(),
                        }));
                        self.render_error = Some(err);
                        self.commit(fallback, CommitOrigin::Rollback, &mut effects);
                        return effects;
                    }
                }
                self.render_error = Some(err);
            }
        }
        effects
    }

    /// Committed source text.
    #[must_use]
    pub fn source(&self) -> &SourceText {
        &self.source
    }

    /// Current visual transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the current generation still awaits its suggestion.
    #[must_use]
    pub fn suggestion_pending(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Requests issued and not yet resolved, stale ones included.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Last text the pipeline rendered successfully.
    #[must_use]
    pub fn last_rendered(&self) -> Option<&SourceText> {
        self.last_rendered.as_ref()
    }

    /// Copy out the observable state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            source: self.source.clone(),
            transform: self.transform,
            generation: self.generation,
            revision: self.revision,
            suggestion_pending: self.suggestion_pending(),
            render_error: self.render_error.clone(),
        }
    }

    fn commit(&mut self, text: SourceText, origin: CommitOrigin, effects: &mut Vec<Effect>) {
        self.revision += 1;
        self.source = text;
        self.last_origin = origin;
        info!(
            revision = self.revision,
            generation = %self.generation,
            origin = origin.label(),
            bytes = self.source.len(),
            "committed source"
        );
        effects.push(Effect::Notify(SyncEvent::Committed {
            revision: self.revision,
            origin,
            generation: self.generation,
            source: self.source.clone(),
        }));
        effects.push(Effect::Render {
            revision: self.revision,
            source: self.source.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_core::UnavailableReason;

    fn rewritten(generation: u64, text: &str) -> SuggestionResult {
        SuggestionResult {
            generation: Generation::new(generation),
            outcome: SuggestionOutcome::Rewritten(SourceText::from(text)),
        }
    }

    fn unavailable(generation: u64) -> SuggestionResult {
        SuggestionResult {
            generation: Generation::new(generation),
            outcome: SuggestionOutcome::Unavailable(UnavailableReason::EmptyResponse),
        }
    }

    fn events(effects: &[Effect]) -> Vec<&SyncEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    fn requests(effects: &[Effect]) -> Vec<&SuggestionRequest> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::RequestSuggestion(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn committed(effects: &[Effect]) -> Option<(CommitOrigin, &SourceText)> {
        events(effects).into_iter().find_map(|e| match e {
            SyncEvent::Committed { origin, source, .. } => Some((*origin, source)),
            _ => None,
        })
    }

    #[test]
    fn test_start_commits_and_renders_initial_text() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        assert_eq!(engine.transform(), Transform::new(200, 100, 0, 0));

        let effects = engine.start();
        assert_eq!(
            committed(&effects).map(|(o, _)| o),
            Some(CommitOrigin::Initial)
        );
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Render { revision: 1, .. })));
    }

    #[test]
    fn test_resize_commits_deterministic_patch_and_requests_suggestion() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        let before = engine.source().clone();

        let effects = engine.manipulate(&ManipulationEvent::resize(300.0, 150.0, 10.0, 20.0));

        assert_eq!(engine.generation(), Generation::new(1));
        let (origin, text) = committed(&effects).expect("deterministic commit");
        assert_eq!(origin, CommitOrigin::Deterministic);
        assert!(text.as_str().contains("width: '300px'"));
        assert!(text.as_str().contains("left: '10px'"));
        assert!(text.as_str().contains("top: '20px'"));

        let reqs = requests(&effects);
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].generation, Generation::new(1));
        assert_eq!(reqs[0].source, before);
        assert_eq!(reqs[0].transform, Transform::new(300, 150, 10, 20));
        assert!(engine.suggestion_pending());

        // an unavailable suggestion leaves the absolute values in place
        let effects = engine.resolve_suggestion(unavailable(1));
        assert!(committed(&effects).is_none());
        assert!(engine.source().as_str().contains("height: '150px'"));
        assert!(!engine.suggestion_pending());
    }

    #[test]
    fn test_current_suggestion_replaces_text() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        engine.manipulate(&ManipulationEvent::drag(40.0, 40.0));

        let effects = engine.resolve_suggestion(rewritten(1, "<div className=\"flex\" />"));
        assert_eq!(
            committed(&effects),
            Some((
                CommitOrigin::Suggestion,
                &SourceText::from("<div className=\"flex\" />")
            ))
        );
        assert_eq!(engine.source().as_str(), "<div className=\"flex\" />");
    }

    #[test]
    fn test_identical_suggestion_resolves_without_commit() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        engine.manipulate(&ManipulationEvent::drag(40.0, 40.0));
        let revision = engine.revision();
        let current = engine.source().as_str().to_string();

        let effects = engine.resolve_suggestion(rewritten(1, &current));
        assert!(committed(&effects).is_none());
        assert_eq!(
            events(&effects),
            [&SyncEvent::SuggestionUnchanged {
                generation: Generation::new(1)
            }]
        );
        assert_eq!(engine.revision(), revision);
        assert!(!engine.suggestion_pending());
    }

    #[test]
    fn test_older_generation_loses_in_every_order() {
        // g1 resolving after g2, before g2, or with g2 unavailable
        for g2_first in [true, false] {
            for g2_available in [true, false] {
                let mut engine = SyncEngine::new(SourceText::default_component());
                engine.start();
                engine.manipulate(&ManipulationEvent::resize(300.0, 150.0, 0.0, 0.0));
                engine.manipulate(&ManipulationEvent::resize(350.0, 175.0, 5.0, 5.0));
                let g2_deterministic = engine.source().clone();

                let g2_result = if g2_available {
                    rewritten(2, "g2 rewrite")
                } else {
                    unavailable(2)
                };
                let expected = if g2_available {
                    SourceText::from("g2 rewrite")
                } else {
                    g2_deterministic
                };

                let stale = if g2_first {
                    engine.resolve_suggestion(g2_result);
                    engine.resolve_suggestion(rewritten(1, "g1 rewrite"))
                } else {
                    let stale = engine.resolve_suggestion(rewritten(1, "g1 rewrite"));
                    engine.resolve_suggestion(g2_result);
                    stale
                };

                assert_eq!(
                    events(&stale),
                    vec![&SyncEvent::StaleSuggestionDiscarded {
                        generation: Generation::new(1),
                        current: Generation::new(2),
                    }]
                );
                assert_eq!(engine.source(), &expected);
                assert_eq!(engine.in_flight(), 0);
            }
        }
    }

    #[test]
    fn test_duplicate_result_for_current_generation_is_stale() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.manipulate(&ManipulationEvent::drag(1.0, 1.0));
        engine.resolve_suggestion(rewritten(1, "first"));

        let effects = engine.resolve_suggestion(rewritten(1, "second"));
        assert!(matches!(
            events(&effects)[..],
            [SyncEvent::StaleSuggestionDiscarded { .. }]
        ));
        assert_eq!(engine.source().as_str(), "first");
    }

    #[test]
    fn test_missing_declaration_keeps_text_and_still_requests() {
        let plain = SourceText::from("const A = () => <h3 className=\"w-6\">Hi</h3>;");
        let mut engine = SyncEngine::new(plain.clone());
        engine.start();

        let effects = engine.manipulate(&ManipulationEvent::resize(300.0, 150.0, 10.0, 20.0));
        assert!(events(&effects)
            .iter()
            .any(|e| matches!(e, SyncEvent::PatchNotApplied { .. })));
        assert!(committed(&effects).is_none());
        assert_eq!(engine.source(), &plain);
        // visual state still moves
        assert_eq!(engine.transform(), Transform::new(300, 150, 10, 20));
        assert_eq!(requests(&effects).len(), 1);
    }

    #[test]
    fn test_manual_edit_never_requests_suggestion() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();

        let edited = engine
            .source()
            .as_str()
            .replace("left: '0px'", "left: '45px'");
        let effects = engine.commit_edit(SourceText::from(edited));

        assert_eq!(
            committed(&effects).map(|(o, _)| o),
            Some(CommitOrigin::ManualEdit)
        );
        assert!(requests(&effects).is_empty());
        assert!(!events(&effects)
            .iter()
            .any(|e| matches!(e, SyncEvent::SuggestionRequested { .. })));
        assert_eq!(engine.generation(), Generation::ZERO);
        assert_eq!(engine.in_flight(), 0);
    }

    #[test]
    fn test_manual_edit_supersedes_pending_suggestion() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        engine.manipulate(&ManipulationEvent::drag(10.0, 10.0));

        engine.commit_edit(SourceText::from("hand typed"));
        assert!(!engine.suggestion_pending());

        let effects = engine.resolve_suggestion(rewritten(1, "late rewrite"));
        assert!(matches!(
            events(&effects)[..],
            [SyncEvent::StaleSuggestionDiscarded { .. }]
        ));
        assert_eq!(engine.source().as_str(), "hand typed");
    }

    #[test]
    fn test_manual_edit_updates_transform_from_declaration() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();

        let edited = engine
            .source()
            .as_str()
            .replace("width: '200px'", "width: '260px'");
        let effects = engine.commit_edit(SourceText::from(edited));

        assert_eq!(engine.transform(), Transform::new(260, 100, 0, 0));
        assert!(events(&effects)
            .iter()
            .any(|e| matches!(e, SyncEvent::TransformChanged { .. })));

        // a drag afterwards keeps the hand-typed width
        engine.manipulate(&ManipulationEvent::drag(30.0, 0.0));
        assert_eq!(engine.transform(), Transform::new(260, 100, 30, 0));
    }

    #[test]
    fn test_unrenderable_suggestion_rolls_back() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        engine.manipulate(&ManipulationEvent::resize(300.0, 150.0, 10.0, 20.0));
        let deterministic = engine.source().clone();

        engine.resolve_suggestion(rewritten(1, "const = broken"));
        let revision = engine.revision();

        let effects = engine.render_finished(revision, Err(RenderError::new("Unexpected token")));
        let kinds: Vec<_> = events(&effects).iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["render_failed", "suggestion_rolled_back", "committed"]
        );
        assert_eq!(engine.source(), &deterministic);
        assert!(effects.iter().any(
            |e| matches!(e, Effect::Render { revision: r, .. } if *r == revision + 1)
        ));

        // the rolled-back text renders fine and clears the error
        engine.render_finished(revision + 1, Ok(()));
        assert_eq!(engine.snapshot().render_error, None);
        assert_eq!(engine.last_rendered(), Some(&deterministic));
    }

    #[test]
    fn test_render_error_on_manual_edit_keeps_text() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        engine.commit_edit(SourceText::from("const A = (;"));

        let effects = engine.render_finished(engine.revision(), Err(RenderError::new("syntax")));
        assert_eq!(events(&effects).len(), 1);
        assert_eq!(engine.source().as_str(), "const A = (;");
        assert_eq!(
            engine.snapshot().render_error,
            Some(RenderError::new("syntax"))
        );
    }

    #[test]
    fn test_outdated_render_report_is_ignored() {
        let mut engine = SyncEngine::new(SourceText::default_component());
        engine.start();
        engine.commit_edit(SourceText::from("newer"));

        let effects = engine.render_finished(1, Err(RenderError::new("old failure")));
        assert!(effects.is_empty());
        assert_eq!(engine.snapshot().render_error, None);
    }
}
