//! # Sync Session
//!
//! Runs a [`SyncEngine`] as a single-writer actor on the tokio runtime.
//!
//! ```text
//!  SessionHandle ──commands──▶ ┌──────────────┐ ──Notify──▶ broadcast<SyncEvent>
//!                              │ SessionActor │ ──Render──▶ RenderPipeline
//!  suggestion tasks ─results─▶ │  SyncEngine  │ ──Request─▶ tokio::spawn(advisor)
//!  debounce deadline ────────▶ └──────────────┘
//! ```
//!
//! Only the actor touches the source text, so no lock guards it. Suggestion
//! requests run as detached tasks and report back over a channel; nothing
//! cancels them, the engine simply discards results that arrive stale.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use layout_advisor::{advisor_from_config, SuggestionService};
use layout_core::{
    ManipulationEvent, RenderPipeline, SourceText, SuggestionOutcome, SuggestionRequest,
    SuggestionResult, UnavailableReason,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::debounce::EditDebouncer;
use crate::engine::{Effect, SessionSnapshot, SyncEngine};
use crate::error::{SessionError, SessionResult};
use crate::event::SyncEvent;
use crate::metrics;

/// Unique identifier for a session, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new unique session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

enum Command {
    ManualEdit { text: SourceText, at: Instant },
    Manipulate(ManipulationEvent),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<SessionSnapshot>),
}

/// Client side of a running session.
///
/// Dropping the handle stops the session once queued commands are handled.
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SyncEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Spawn a session over `initial` using an explicit suggestion service.
    ///
    /// Returns the handle and a receiver subscribed before the first event,
    /// so the initial commit is never missed.
    pub fn spawn<P>(
        config: &SyncConfig,
        initial: SourceText,
        advisor: Arc<dyn SuggestionService>,
        pipeline: P,
    ) -> (Self, broadcast::Receiver<SyncEvent>)
    where
        P: RenderPipeline + 'static,
    {
        let id = SessionId::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = broadcast::channel(config.event_capacity.max(1));

        let actor = SessionActor {
            id,
            engine: SyncEngine::new(initial),
            debouncer: EditDebouncer::new(config.debounce),
            pipeline,
            advisor,
            suggestion_timeout: config.suggestion_timeout,
            commands: commands_rx,
            results_tx,
            results_rx,
            events: events_tx.clone(),
        };

        let span = tracing::info_span!("layout_session", session = %id);
        let task = tokio::spawn(actor.run().instrument(span));
        info!(session = %id, debounce_ms = config.debounce.as_millis(), "Sync session started");

        (
            Self {
                id,
                commands: commands_tx,
                events: events_tx,
                task,
            },
            events_rx,
        )
    }

    /// Spawn a session whose suggestion service is built from `config`.
    ///
    /// Without a credential the session runs with suggestions disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Advisor`] if a credential is configured but
    /// the client cannot be built.
    pub fn connect<P>(
        config: &SyncConfig,
        initial: SourceText,
        pipeline: P,
    ) -> SessionResult<(Self, broadcast::Receiver<SyncEvent>)>
    where
        P: RenderPipeline + 'static,
    {
        let advisor = advisor_from_config(&config.advisor)?;
        Ok(Self::spawn(config, initial, advisor, pipeline))
    }

    /// The session's ID.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Report a keystroke; the text commits after the debounce interval.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub fn manual_edit(&self, text: impl Into<SourceText>) -> SessionResult<()> {
        self.send(Command::ManualEdit {
            text: text.into(),
            at: Instant::now(),
        })
    }

    /// Report a finished drag or resize.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub fn manipulate(&self, event: ManipulationEvent) -> SessionResult<()> {
        self.send(Command::Manipulate(event))
    }

    /// Fetch the current engine state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session has stopped.
    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| self.closed())
    }

    /// Commit any pending edit, stop the session and return its final state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session had already stopped.
    pub async fn shutdown(self) -> SessionResult<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        let snapshot = rx.await.map_err(|_| self.closed())?;
        if let Err(e) = self.task.await {
            warn!(session = %self.id, "session task ended abnormally: {e}");
        }
        Ok(snapshot)
    }

    fn send(&self, command: Command) -> SessionResult<()> {
        self.commands.send(command).map_err(|_| self.closed())
    }

    fn closed(&self) -> SessionError {
        SessionError::Closed(self.id.to_string())
    }
}

/// Run one suggestion request, bounded by `limit`.
///
/// A request still pending after `limit` resolves as
/// [`UnavailableReason::Timeout`].
pub async fn request_layout_rewrite(
    service: &dyn SuggestionService,
    request: &SuggestionRequest,
    limit: Duration,
) -> SuggestionResult {
    let outcome = match tokio::time::timeout(limit, service.rewrite(request)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            let millis = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            warn!(generation = %request.generation, millis, "suggestion request timed out");
            SuggestionOutcome::Unavailable(UnavailableReason::Timeout(millis))
        }
    };
    SuggestionResult::for_request(request, outcome)
}

struct SessionActor<P> {
    id: SessionId,
    engine: SyncEngine,
    debouncer: EditDebouncer,
    pipeline: P,
    advisor: Arc<dyn SuggestionService>,
    suggestion_timeout: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    results_tx: mpsc::UnboundedSender<SuggestionResult>,
    results_rx: mpsc::UnboundedReceiver<SuggestionResult>,
    events: broadcast::Sender<SyncEvent>,
}

impl<P: RenderPipeline> SessionActor<P> {
    async fn run(mut self) {
        let effects = self.engine.start();
        self.drive(effects);

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("all session handles dropped");
                        break;
                    };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }

                Some(result) = self.results_rx.recv() => {
                    let effects = self.engine.resolve_suggestion(result);
                    self.drive(effects);
                }

                () = wait_until(deadline) => {
                    if let Some(text) = self.debouncer.take_due(Instant::now()) {
                        let effects = self.engine.commit_edit(text);
                        self.drive(effects);
                    }
                }
            }
        }

        info!(revision = self.engine.revision(), "Sync session stopped");
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::ManualEdit { text, at } => {
                // the deadline may have passed while the actor was busy
                if let Some(due) = self.debouncer.on_manual_edit(text, at) {
                    let effects = self.engine.commit_edit(due);
                    self.drive(effects);
                }
            }
            Command::Manipulate(event) => {
                // typed text must not overwrite the patch later
                self.flush_pending_edit();
                metrics::record_manipulation(event.label());
                let effects = self.engine.manipulate(&event);
                self.drive(effects);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
            Command::Shutdown(reply) => {
                self.flush_pending_edit();
                let _ = reply.send(self.engine.snapshot());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn flush_pending_edit(&mut self) {
        if let Some(text) = self.debouncer.flush() {
            let effects = self.engine.commit_edit(text);
            self.drive(effects);
        }
    }

    fn drive(&mut self, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Notify(event) => {
                    metrics::observe(&event);
                    // no subscribers is fine
                    let _ = self.events.send(event);
                }
                Effect::Render { revision, source } => {
                    let result = self.pipeline.render(&source);
                    queue.extend(self.engine.render_finished(revision, result));
                }
                Effect::RequestSuggestion(request) => self.spawn_suggestion(request),
            }
        }
        metrics::set_suggestions_in_flight(self.engine.in_flight());
    }

    fn spawn_suggestion(&self, request: SuggestionRequest) {
        let advisor = Arc::clone(&self.advisor);
        let results = self.results_tx.clone();
        let limit = self.suggestion_timeout;
        let span = tracing::debug_span!(
            "suggestion",
            session = %self.id,
            generation = %request.generation
        );

        tokio::spawn(
            async move {
                let result = request_layout_rewrite(advisor.as_ref(), &request, limit).await;
                debug!(outcome = result.outcome.label(), "suggestion resolved");
                if results.send(result).is_err() {
                    debug!("session closed before suggestion arrived");
                }
            }
            .instrument(span),
        );
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
