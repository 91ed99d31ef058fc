//! Pen and fill colors.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// An RGBA color with floating point channels in `[0, 1]`.
///
/// Colors always travel over the wire as four independent channels,
/// never as a packed integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const BLUE: Rgba = Rgba::const_new(0.0, 0.0, 1.0, 1.0);
    pub const RED: Rgba = Rgba::const_new(1.0, 0.0, 0.0, 1.0);
    pub const BLACK: Rgba = Rgba::const_new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::const_new(1.0, 1.0, 1.0, 1.0);
    pub const GRAY: Rgba = Rgba::const_new(0.5, 0.5, 0.5, 1.0);
    pub const CLEAR: Rgba = Rgba::const_new(0.0, 0.0, 0.0, 0.0);

    const fn const_new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Create a color, clamping every channel into `[0, 1]`.
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: clamp_channel(red),
            green: clamp_channel(green),
            blue: clamp_channel(blue),
            alpha: clamp_channel(alpha),
        }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self::new(self.red, self.green, self.blue, alpha)
    }

    /// Same color with its alpha scaled by `factor`.
    pub fn faded(self, factor: f64) -> Self {
        self.with_alpha(self.alpha * factor)
    }

    /// Channels in wire order.
    pub fn channels(&self) -> [f64; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

fn clamp_channel(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let [r, g, b, a] = color.components;
        Self::new(r as f64, g as f64, b as f64, a as f64)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::new([
            color.red as f32,
            color.green as f32,
            color.blue as f32,
            color.alpha as f32,
        ])
    }
}
