//! Tortoise Render Library
//!
//! Replays a turtle's drawing history into a scene and renders it.

mod renderer;
mod scene;
mod svg;

pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use scene::{LABEL_TYPEFACE, LabelNode, Scene, SceneNode, ShapeNode, build_scene};
pub use svg::SvgRenderer;

use kurbo::Size;
use tortoise_core::Turtle;

/// Render a turtle's drawing as an SVG document.
pub fn render_svg(turtle: &Turtle, viewport_size: Size) -> RenderResult<String> {
    let scene = build_scene(turtle);
    SvgRenderer::new().render(&RenderContext::new(&scene, viewport_size))
}
