//! # Live Layout Sync
//!
//! Keeps a component's source text and its on-screen box in agreement.
//!
//! Manual edits are debounced before they commit. Drags and resizes commit
//! a deterministic patch at once and then ask a [`SuggestionService`] for a
//! relative-layout rewrite. Each manipulation opens a new generation, and a
//! suggestion is applied only while its generation is still current, no
//! matter in which order requests complete.
//!
//! ## Layout
//!
//! - [`engine`]: the pure state machine, returning [`Effect`]s
//! - [`debounce`]: the quiet-interval buffer for keystrokes
//! - [`session`]: the tokio actor that runs both and owns the source text
//!
//! [`SuggestionService`]: layout_advisor::SuggestionService

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;
pub mod session;

pub use config::SyncConfig;
pub use debounce::EditDebouncer;
pub use engine::{Effect, SessionSnapshot, SyncEngine};
pub use error::{SessionError, SessionResult};
pub use event::{CommitOrigin, SyncEvent};
pub use session::{request_layout_rewrite, SessionHandle, SessionId};
