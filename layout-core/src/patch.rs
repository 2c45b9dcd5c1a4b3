//! # Text Patch Engine
//!
//! Rewrites the first inline style object of a component so it reflects a
//! [`Transform`], and reads a transform back out of it.
//!
//! ```text
//! style={{ width: '200px', ... }}   ──apply_transform(300x150 @ 10,20)──▶
//! style={{
//!   width: '300px',
//!   height: '150px',
//!   position: 'absolute',
//!   left: '10px',
//!   top: '20px'
//! }}
//! ```
//!
//! Only the first declaration is ever touched. Sources without one are
//! reported as [`PatchError::NotApplied`].

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PatchError, PatchResult};
use crate::source::SourceText;
use crate::transform::{coerce_px, Transform};

/// An inline style object literal: `style={{ ... }}`.
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"style=\{\s*\{[^{}]*\}\s*\}").expect("declaration pattern is valid")
});

/// A positional property inside a declaration.
///
/// The key must start a property name, so `min-width` or `'border-top'`
/// never count.
static PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[\s{,'"])(?P<key>width|height|left|top)['"]?\s*:\s*['"]?\s*(?P<value>-?\d+(?:\.\d+)?)"#,
    )
    .expect("property pattern is valid")
});

/// Byte range of the first style declaration in `source`, if any.
#[must_use]
pub fn find_declaration(source: &str) -> Option<Range<usize>> {
    DECLARATION.find(source).map(|m| m.range())
}

/// Replace the first style declaration with one reflecting `transform`.
///
/// # Errors
///
/// Returns [`PatchError::NotApplied`] when `source` has no declaration; the
/// caller should keep `source` as it is.
pub fn apply_transform(source: &SourceText, transform: &Transform) -> PatchResult<SourceText> {
    let text = source.as_str();
    let range = find_declaration(text).ok_or(PatchError::NotApplied)?;

    let indent = line_indent(text, range.start);
    let declaration = render_declaration(transform, indent);

    let mut patched = String::with_capacity(text.len() + declaration.len());
    patched.push_str(&text[..range.start]);
    patched.push_str(&declaration);
    patched.push_str(&text[range.end..]);

    tracing::trace!(%transform, "patched style declaration");
    Ok(SourceText::from(patched))
}

/// Read the positional values of the first style declaration.
///
/// Missing width/height fall back to [`Transform::default`], missing
/// left/top to zero. Returns `None` when there is no declaration or it
/// carries none of the four properties.
#[must_use]
pub fn read_transform(source: &SourceText) -> Option<Transform> {
    let text = source.as_str();
    let range = find_declaration(text)?;
    let body = &text[range];

    let defaults = Transform::default();
    let mut transform = Transform::new(defaults.width, defaults.height, 0, 0);
    let mut found = false;

    for caps in PROPERTY.captures_iter(body) {
        let Ok(value) = caps["value"].parse::<f64>() else {
            continue;
        };
        let px = coerce_px(value);
        match &caps["key"] {
            "width" => transform.width = px,
            "height" => transform.height = px,
            "left" => transform.x = px,
            "top" => transform.y = px,
            _ => continue,
        }
        found = true;
    }

    found.then_some(transform)
}

fn line_indent(text: &str, at: usize) -> &str {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..at];
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

fn render_declaration(transform: &Transform, indent: &str) -> String {
    let mut out = String::from("style={{\n");
    let props = [
        ("width", format!("{}px", transform.width)),
        ("height", format!("{}px", transform.height)),
        ("position", "absolute".to_string()),
        ("left", format!("{}px", transform.x)),
        ("top", format!("{}px", transform.y)),
    ];
    for (i, (key, value)) in props.iter().enumerate() {
        let sep = if i + 1 < props.len() { "," } else { "" };
        // writing to a String cannot fail
        let _ = writeln!(out, "{indent}  {key}: '{value}'{sep}");
    }
    out.push_str(indent);
    out.push_str("}}");
    out
}
