//! Prompt construction and response cleanup.

use layout_core::{SourceText, SuggestionRequest};
use serde_json::json;

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Fixed task description for the service.
pub const INSTRUCTIONS: &str = "\
Rewrite the component so its layout uses CSS Flexbox or Grid properties such as \
justify-content, align-items and flex-direction instead of absolute positioning.
Do not use fixed dimensions or coordinates: no width, height, left or top.
Keep the component name, its content and the final render(...) call.
Return only the JSX code and the render call, with no explanations, no Markdown \
and no code fences.";

/// Build the user message for `request`.
#[must_use]
pub fn user_prompt(request: &SuggestionRequest) -> String {
    let t = request.transform;
    let dimensions = json!({
        "width": t.width,
        "height": t.height,
        "x": t.x,
        "y": t.y,
    });
    format!(
        "Given the following React component code and new dimensions:\n\n{}\n\nNew dimensions: {}\n\n{}",
        request.source.as_str().trim(),
        dimensions,
        INSTRUCTIONS
    )
}

/// Strip whitespace and surrounding Markdown fences from a completion.
///
/// Returns `None` when nothing usable is left.
#[must_use]
pub fn tidy_response(raw: &str) -> Option<SourceText> {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string (```jsx) along with the fence line
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text);
        text = text.trim();
    }

    if text.is_empty() {
        None
    } else {
        Some(SourceText::from(format!("{text}\n")))
    }
}
