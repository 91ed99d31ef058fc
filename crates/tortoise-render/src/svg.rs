//! SVG output.

use std::fmt::Write as _;

use kurbo::{Affine, Point};
use peniko::Color;

use crate::renderer::{RenderContext, Renderer, RendererError};
use crate::scene::{LabelNode, SceneNode, ShapeNode};

/// Renders a scene as a standalone SVG document.
///
/// Turtle space has its origin in the middle of the canvas and y pointing up;
/// SVG has its origin top-left and y pointing down.
#[derive(Debug, Default)]
pub struct SvgRenderer;

impl SvgRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for SvgRenderer {
    type Output = String;

    fn render(&mut self, ctx: &RenderContext) -> Result<String, RendererError> {
        let size = ctx.viewport_size;
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(RendererError::InvalidViewport {
                width: size.width,
                height: size.height,
            });
        }
        let transform = Affine::new([
            1.0,
            0.0,
            0.0,
            -1.0,
            size.width / 2.0,
            size.height / 2.0,
        ]);

        let mut out = String::new();
        let background = self.background_color(ctx);
        write_document(&mut out, ctx, background, transform)
            .map_err(|err| RendererError::RenderFailed(err.to_string()))?;
        Ok(out)
    }
}

fn write_document(
    out: &mut String,
    ctx: &RenderContext,
    background: Color,
    transform: Affine,
) -> std::fmt::Result {
    let size = ctx.viewport_size;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height
    )?;
    writeln!(
        out,
        r#"  <rect width="100%" height="100%" fill="{}"{}/>"#,
        hex(background),
        opacity_attr("fill-opacity", background)
    )?;
    for node in &ctx.scene.nodes {
        match node {
            SceneNode::Shape(shape) => write_shape(out, shape, transform)?,
            SceneNode::Label(label) => write_label(out, label, transform)?,
        }
    }
    writeln!(out, "</svg>")
}

fn write_shape(out: &mut String, shape: &ShapeNode, transform: Affine) -> std::fmt::Result {
    let mut path = shape.path.clone();
    path.apply_affine(transform);
    if path.segments().next().is_none() {
        return Ok(());
    }
    writeln!(
        out,
        r#"  <path d="{}" fill="{}"{} stroke="{}"{} stroke-width="{}" stroke-linecap="round"/>"#,
        path.to_svg(),
        paint(shape.fill_color),
        opacity_attr("fill-opacity", shape.fill_color),
        paint(shape.stroke_color),
        opacity_attr("stroke-opacity", shape.stroke_color),
        shape.line_width()
    )
}

fn write_label(out: &mut String, label: &LabelNode, transform: Affine) -> std::fmt::Result {
    let Point { x, y } = transform * label.position;
    let (family, weight) = font_attrs(label.typeface);
    writeln!(
        out,
        r#"  <text x="{x}" y="{y}" font-family="{family}" font-weight="{weight}" font-size="{}" letter-spacing="{}" fill="{}"{}>{}</text>"#,
        label.font_size,
        label.kerning,
        hex(label.color),
        opacity_attr("fill-opacity", label.color),
        escape(&label.message)
    )
}

fn font_attrs(typeface: &str) -> (&str, &str) {
    match typeface.split_once('-') {
        Some((family, "Bold")) => (family, "bold"),
        _ => (typeface, "normal"),
    }
}

fn paint(color: Color) -> String {
    if color.components[3] <= 0.0 {
        "none".to_string()
    } else {
        hex(color)
    }
}

fn hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
}

fn opacity_attr(name: &str, color: Color) -> String {
    let alpha = color.components[3];
    if alpha >= 1.0 || alpha <= 0.0 {
        String::new()
    } else {
        format!(r#" {name}="{alpha}""#)
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, build_scene};
    use kurbo::{BezPath, Size};
    use tortoise_core::{Rgba, Text, Turtle, TurtleOps};

    fn render(turtle: &Turtle) -> String {
        let scene = build_scene(turtle);
        let ctx = RenderContext::new(&scene, Size::new(200.0, 100.0));
        SvgRenderer::new().render(&ctx).unwrap()
    }

    #[test]
    fn test_line_is_flipped_and_centred() {
        let mut turtle = Turtle::new();
        turtle.left(90.0);
        turtle.forward(40.0);
        let svg = render(&turtle);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##));
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
        let mut expected = BezPath::new();
        expected.move_to((100.0, 50.0));
        expected.line_to((100.0, 10.0));
        assert!(svg.contains(&format!(r#"d="{}""#, expected.to_svg())), "{svg}");
        assert!(svg.contains(r##"stroke="#0000ff""##));
        assert!(svg.contains(r#"fill="none""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_live_path_is_skipped() {
        let svg = render(&Turtle::new());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_label_is_escaped() {
        let mut turtle = Turtle::new();
        turtle.draw_text(Text::new("a<b & c", Point::new(10.0, 10.0)).with_color(Rgba::RED));
        let svg = render(&turtle);
        assert!(svg.contains("a&lt;b &amp; c"));
        assert!(svg.contains(r#"x="110" y="40""#), "{svg}");
        assert!(svg.contains(r#"font-family="Helvetica" font-weight="bold""#));
        assert!(svg.contains(r##"fill="#ff0000""##));
    }

    #[test]
    fn test_translucent_colors_carry_opacity() {
        let mut turtle = Turtle::new();
        turtle.set_pen_color(Rgba::BLACK.with_alpha(0.5));
        turtle.forward(10.0);
        let svg = render(&turtle);
        assert!(svg.contains(r#"stroke-opacity="0.5""#));
    }

    #[test]
    fn test_invalid_viewport() {
        let scene = Scene::default();
        let ctx = RenderContext::new(&scene, Size::new(0.0, 10.0));
        assert!(matches!(
            SvgRenderer::new().render(&ctx),
            Err(RendererError::InvalidViewport { .. })
        ));
    }
}
