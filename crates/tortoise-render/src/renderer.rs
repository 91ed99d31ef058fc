//! Renderer trait abstraction.

use kurbo::Size;
use peniko::Color;
use thiserror::Error;
use tortoise_core::Rgba;

use crate::scene::Scene;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid viewport {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render.
pub struct RenderContext<'a> {
    /// The scene to render.
    pub scene: &'a Scene,
    /// Canvas size. The turtle's origin sits in its centre.
    pub viewport_size: Size,
    /// Background color.
    pub background_color: Color,
}

impl<'a> RenderContext<'a> {
    pub fn new(scene: &'a Scene, viewport_size: Size) -> Self {
        Self {
            scene,
            viewport_size,
            background_color: Rgba::WHITE.into(),
        }
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    type Output;

    /// Render every node of the scene, bottom first.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Self::Output>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
