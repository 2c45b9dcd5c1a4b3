//! Boundary to the external render pipeline.

use crate::error::RenderError;
use crate::source::SourceText;

/// Turns committed source text into a visual tree.
///
/// Implemented outside this workspace (a live component evaluator, a
/// preview pane). Called once per commit; never retried.
pub trait RenderPipeline: Send {
    /// Render `source`, replacing whatever was shown before.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the source cannot be compiled or
    /// evaluated. The caller surfaces it and keeps the source.
    fn render(&mut self, source: &SourceText) -> Result<(), RenderError>;
}

impl<F> RenderPipeline for F
where
    F: FnMut(&SourceText) -> Result<(), RenderError> + Send,
{
    fn render(&mut self, source: &SourceText) -> Result<(), RenderError> {
        self(source)
    }
}
