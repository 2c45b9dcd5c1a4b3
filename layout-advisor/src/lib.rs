//! # Live Layout Advisor
//!
//! Asynchronous boundary to an external text-completion service that
//! rewrites absolutely positioned components into relative (flex/grid)
//! layouts.
//!
//! Every failure (no credential, network, rejected credential, empty
//! answer) is folded into [`SuggestionOutcome::Unavailable`]; callers never
//! see a transport error and never need to handle one.
//!
//! ## Usage
//!
//! ```no_run
//! use layout_advisor::{advisor_from_config, AdvisorConfig, SuggestionService};
//! use layout_core::{Generation, SourceText, SuggestionRequest, Transform};
//!
//! # async fn demo() -> Result<(), layout_advisor::AdvisorError> {
//! let advisor = advisor_from_config(&AdvisorConfig::from_env())?;
//! let outcome = advisor
//!     .rewrite(&SuggestionRequest {
//!         generation: Generation::new(1),
//!         source: SourceText::default_component(),
//!         transform: Transform::new(300, 150, 10, 20),
//!     })
//!     .await;
//! println!("{}", outcome.label());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use async_trait::async_trait;
use layout_core::{SuggestionOutcome, SuggestionRequest, UnavailableReason};

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;

pub use client::ChatCompletionsAdvisor;
pub use config::AdvisorConfig;
pub use error::AdvisorError;

/// Produces layout rewrites for manipulation requests.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Request a relative-layout rewrite of `request.source`.
    async fn rewrite(&self, request: &SuggestionRequest) -> SuggestionOutcome;
}

/// Service used when no credential is configured; never suggests anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl SuggestionService for DisabledAdvisor {
    async fn rewrite(&self, _request: &SuggestionRequest) -> SuggestionOutcome {
        SuggestionOutcome::Unavailable(UnavailableReason::MissingCredential)
    }
}

/// Build the service described by `config`.
///
/// A missing credential yields a [`DisabledAdvisor`] rather than an error.
///
/// # Errors
///
/// Returns an error if a credential is present but the client cannot be
/// built (invalid URL, TLS backend failure).
pub fn advisor_from_config(
    config: &AdvisorConfig,
) -> Result<Arc<dyn SuggestionService>, AdvisorError> {
    if !config.has_credential() {
        tracing::info!("No suggestion service credential configured; layout suggestions disabled");
        return Ok(Arc::new(DisabledAdvisor));
    }
    let client = ChatCompletionsAdvisor::new(config)?;
    tracing::info!(endpoint = %client.endpoint(), model = %config.model, "Layout suggestions enabled");
    Ok(Arc::new(client))
}
