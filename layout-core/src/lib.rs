//! # Live Layout Core
//!
//! Data model shared by the layout sync engine, the suggestion advisor and
//! hosts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 layout-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Transform Model   │  Text Patch Engine     │
//! │  - Drag / resize   │  - Locate style block  │
//! │  - Coercion        │  - Rewrite positions   │
//! │  - Parent bounds   │  - Read positions back │
//! ├─────────────────────────────────────────────┤
//! │  Suggestions       │  Render boundary       │
//! │  - Generations     │  - RenderPipeline      │
//! │  - Request/result  │  - RenderError         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod patch;
pub mod render;
pub mod source;
pub mod suggestion;
pub mod transform;

pub use error::{PatchError, PatchResult, RenderError, UnavailableReason};
pub use patch::{apply_transform, find_declaration, read_transform};
pub use render::RenderPipeline;
pub use source::{SourceText, DEFAULT_COMPONENT};
pub use suggestion::{Generation, SuggestionOutcome, SuggestionRequest, SuggestionResult};
pub use transform::{
    coerce_px, derive_transform, Bounds, Manipulation, ManipulationEvent, Point, Size, Transform,
};

/// Layout core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
