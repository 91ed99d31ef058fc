//! Finished drawings kept in the turtle's history.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::path::TurtlePath;

/// A text label placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub message: String,
    /// Baseline origin.
    pub position: Point,
    /// Font size in points.
    pub size: f64,
    /// Extra spacing between glyphs.
    pub kerning: f64,
    pub color: Rgba,
}

impl Text {
    /// Default font size used by `draw_text` callers.
    pub const DEFAULT_SIZE: f64 = 24.0;

    pub fn new(message: impl Into<String>, position: Point) -> Self {
        Self {
            message: message.into(),
            position,
            size: Self::DEFAULT_SIZE,
            kerning: 0.0,
            color: Rgba::BLACK,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_kerning(mut self, kerning: f64) -> Self {
        self.kerning = kerning;
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }
}

/// An immutable snapshot of the live path and the style it was drawn with.
///
/// Paths carry no per-segment style, so whenever a style attribute changes
/// the live path is frozen into a `Drawing` and a fresh path is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub path: TurtlePath,
    pub position: Point,
    pub fill_color: Rgba,
    pub stroke_color: Rgba,
    pub line_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
}

impl Drawing {
    /// Whether this drawing is a text label rather than a stroked shape.
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}
