//! Component source text.

use serde::{Deserialize, Serialize};

/// Component definition the editor starts from when none is supplied.
pub const DEFAULT_COMPONENT: &str = r#"
const MyComponent = () => {
  return (
    <h3
      className="border bg-yellow-500 text-white p-4 rounded-md"
      style={{
        width: '200px',
        height: '100px',
        position: 'absolute',
        left: '0px',
        top: '0px'
      }}
    >
      Hello World! 👋
    </h3>
  );
};

render(<Wrapper><MyComponent /></Wrapper>);
"#;

/// The authoritative text of the component being edited.
///
/// Opaque to the engine apart from the single style declaration the
/// patch engine knows how to find.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceText(String);

impl SourceText {
    /// Wrap a string as source text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The built-in starter component.
    #[must_use]
    pub fn default_component() -> Self {
        Self::new(DEFAULT_COMPONENT)
    }

    /// Borrow the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
