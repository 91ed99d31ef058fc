//! Retained scene built from a turtle's drawing history.

use kurbo::{BezPath, Cap, Point, Stroke};
use peniko::Color;
use tortoise_core::{Drawing, Text, Turtle};

/// Typeface used for every label.
pub const LABEL_TYPEFACE: &str = "Helvetica-Bold";

/// A stroked and filled path.
#[derive(Debug, Clone)]
pub struct ShapeNode {
    pub path: BezPath,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke: Stroke,
}

impl ShapeNode {
    pub fn line_width(&self) -> f64 {
        self.stroke.width
    }
}

/// A text label.
#[derive(Debug, Clone)]
pub struct LabelNode {
    pub message: String,
    pub position: Point,
    pub font_size: f64,
    pub typeface: &'static str,
    pub obliqueness: f64,
    pub kerning: f64,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    Shape(ShapeNode),
    Label(LabelNode),
}

/// Nodes in paint order, bottom first.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &ShapeNode> {
        self.nodes.iter().filter_map(|node| match node {
            SceneNode::Shape(shape) => Some(shape),
            SceneNode::Label(_) => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelNode> {
        self.nodes.iter().filter_map(|node| match node {
            SceneNode::Label(label) => Some(label),
            SceneNode::Shape(_) => None,
        })
    }
}

/// Replay the turtle's finished drawings, oldest first, then its live path.
pub fn build_scene(turtle: &Turtle) -> Scene {
    let mut nodes: Vec<SceneNode> = turtle.drawings().iter().map(drawing_node).collect();
    nodes.push(SceneNode::Shape(shape_node(&turtle.snapshot())));
    log::debug!("built scene with {} nodes", nodes.len());
    Scene { nodes }
}

fn drawing_node(drawing: &Drawing) -> SceneNode {
    match &drawing.text {
        Some(text) => SceneNode::Label(label_node(text)),
        None => SceneNode::Shape(shape_node(drawing)),
    }
}

fn shape_node(drawing: &Drawing) -> ShapeNode {
    ShapeNode {
        path: drawing.path.bez_path().clone(),
        stroke_color: drawing.stroke_color.into(),
        fill_color: drawing.fill_color.into(),
        stroke: Stroke::new(drawing.line_width).with_caps(Cap::Round),
    }
}

fn label_node(text: &Text) -> LabelNode {
    LabelNode {
        message: text.message.clone(),
        position: text.position,
        font_size: text.size,
        typeface: LABEL_TYPEFACE,
        obliqueness: 0.0,
        kerning: text.kerning,
        color: text.color.into(),
    }
}
