//! Geometric state of the manipulated element and the manipulation events
//! that produce it.

use serde::{Deserialize, Serialize};

/// Position and size of the manipulated element, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// X offset from the parent's left edge.
    pub x: u32,
    /// Y offset from the parent's top edge.
    pub y: u32,
}

impl Transform {
    /// Create a transform from its four components.
    #[must_use]
    pub const fn new(width: u32, height: u32, x: u32, y: u32) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    /// Clamp so the element stays inside `bounds`: size first, then offset.
    #[must_use]
    pub fn clamped_to(self, bounds: Bounds) -> Self {
        let max_width = coerce_px(bounds.width);
        let max_height = coerce_px(bounds.height);
        let width = self.width.min(max_width);
        let height = self.height.min(max_height);
        Self {
            width,
            height,
            x: self.x.min(max_width - width),
            y: self.y.min(max_height - height),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(200, 100, 0, 0)
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} @ ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

/// A point reported by the manipulation widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

/// A size reported by the manipulation widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Create a size from numeric components.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Parse a size from CSS length strings such as `"300px"`.
    ///
    /// Only the leading integer is read; anything unparseable becomes zero.
    #[must_use]
    pub fn from_css(width: &str, height: &str) -> Self {
        Self {
            width: parse_css_px(width),
            height: parse_css_px(height),
        }
    }
}

/// The parent box that constrains manipulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Parent width.
    pub width: f64,
    /// Parent height.
    pub height: f64,
}

/// Payload shared by drag and resize events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Manipulation {
    /// Resulting offset of the element inside its parent.
    pub position: Point,
    /// Resulting size of the element.
    #[serde(default)]
    pub size: Size,
    /// Parent bounding box, when known.
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

/// A discrete drag or resize action from direct visual interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManipulationEvent {
    /// Element moved; its size is unchanged.
    Drag(Manipulation),
    /// Element resized; offset may change too (resizing from a top/left handle).
    Resize(Manipulation),
}

impl ManipulationEvent {
    /// Build a drag event ending at `(x, y)`.
    #[must_use]
    pub fn drag(x: f64, y: f64) -> Self {
        Self::Drag(Manipulation {
            position: Point { x, y },
            ..Manipulation::default()
        })
    }

    /// Build a resize event ending at `(x, y)` with the given size.
    #[must_use]
    pub fn resize(width: f64, height: f64, x: f64, y: f64) -> Self {
        Self::Resize(Manipulation {
            position: Point { x, y },
            size: Size::new(width, height),
            bounds: None,
        })
    }

    /// Attach the parent bounding box.
    #[must_use]
    pub fn within(self, bounds: Bounds) -> Self {
        match self {
            Self::Drag(m) => Self::Drag(Manipulation {
                bounds: Some(bounds),
                ..m
            }),
            Self::Resize(m) => Self::Resize(Manipulation {
                bounds: Some(bounds),
                ..m
            }),
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Drag(_) => "drag",
            Self::Resize(_) => "resize",
        }
    }
}

/// Compute the transform that results from `event`.
///
/// Resizes take size and offset from the event; drags keep the size of
/// `previous` and only move. Malformed numbers clamp to zero.
#[must_use]
pub fn derive_transform(event: &ManipulationEvent, previous: &Transform) -> Transform {
    let (next, bounds) = match event {
        ManipulationEvent::Drag(m) => (
            Transform {
                width: previous.width,
                height: previous.height,
                x: coerce_px(m.position.x),
                y: coerce_px(m.position.y),
            },
            m.bounds,
        ),
        ManipulationEvent::Resize(m) => (
            Transform {
                width: coerce_px(m.size.width),
                height: coerce_px(m.size.height),
                x: coerce_px(m.position.x),
                y: coerce_px(m.position.y),
            },
            m.bounds,
        ),
    };

    match bounds {
        Some(bounds) => next.clamped_to(bounds),
        None => next,
    }
}

/// Coerce a reported coordinate to a non-negative whole pixel count.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_px(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    // `as` saturates at u32::MAX for large and infinite values
    value.round() as u32
}

#[allow(clippy::cast_precision_loss)]
fn parse_css_px(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    match digits[..end].parse::<u64>() {
        Ok(n) if negative => -(n as f64),
        Ok(n) => n as f64,
        Err(_) => 0.0,
    }
}
