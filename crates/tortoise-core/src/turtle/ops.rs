//! The mutation interface shared by every turtle that draws.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use super::Turtle;
use crate::color::Rgba;
use crate::drawing::Text;

/// Alpha factor applied to grid lines and curve handles.
const FAINT: f64 = 0.25;
/// Font size of axis and control point labels.
const LABEL_SIZE: f64 = 10.0;
/// Upper bound on grid lines per half axis.
const MAX_AXIS_STEPS: usize = 1000;

/// Which point of a shape the `at` coordinate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anchor {
    #[default]
    BottomLeft,
    Centre,
}

impl Anchor {
    /// Bottom-left corner of a `width` by `height` box anchored at `at`.
    pub fn origin(self, at: Point, width: f64, height: f64) -> Point {
        match self {
            Anchor::BottomLeft => at,
            Anchor::Centre => Point::new(at.x - width / 2.0, at.y - height / 2.0),
        }
    }

    pub fn from_bottom_left(anchored_at_bottom_left: bool) -> Self {
        if anchored_at_bottom_left {
            Anchor::BottomLeft
        } else {
            Anchor::Centre
        }
    }

    pub fn is_bottom_left(self) -> bool {
        self == Anchor::BottomLeft
    }
}

/// A circular arc given by absolute center and angles (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularArc {
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// `true` sweeps with increasing angle.
    pub clockwise: bool,
}

/// A cubic bezier segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub from: Point,
    pub to: Point,
    pub control1: Point,
    pub control2: Point,
    /// Also draw handle lines and coordinate labels.
    pub show_control_points: bool,
}

/// Coordinate axes through the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    /// Draw grid lines and numeric labels.
    pub with_scale: bool,
    /// Spacing between grid lines.
    pub by: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgba,
}

impl Default for Axes {
    fn default() -> Self {
        Self {
            with_scale: true,
            by: 50.0,
            width: 400.0,
            height: 400.0,
            color: Rgba::GRAY,
        }
    }
}

/// Operations every drawing turtle supports.
///
/// Implemented by the plain [`Turtle`], which only mutates itself, and by the
/// authoritative turtle, which also transmits each primitive. Compound
/// operations are written once here in terms of the primitives, so a replica
/// receiving the primitive commands ends up in the same state.
pub trait TurtleOps {
    /// Current state, for reading.
    fn turtle(&self) -> &Turtle;

    /// Move along the current heading, drawing if the pen is down.
    fn forward(&mut self, distance: f64);

    /// Move by explicit offsets, drawing if the pen is down.
    fn diagonal(&mut self, dx: f64, dy: f64);

    /// Turn counter-clockwise. The heading is never wrapped.
    fn left(&mut self, angle: f64);

    fn set_heading(&mut self, heading: f64);

    fn pen_up(&mut self);

    fn pen_down(&mut self);

    /// Arc tangent to the current heading; positive angles turn left.
    fn arc(&mut self, radius: f64, angle: f64);

    /// Arc around an absolute center. Leaves the heading alone.
    fn draw_arc(&mut self, arc: &CircularArc);

    /// Append a bezier segment without any handle decoration.
    fn add_curve(&mut self, curve: &Curve);

    fn draw_rectangle(&mut self, at: Point, width: f64, height: f64, anchor: Anchor);

    fn draw_rounded_rectangle(
        &mut self,
        at: Point,
        width: f64,
        height: f64,
        corner_radius: f64,
        anchor: Anchor,
    );

    fn draw_ellipse(&mut self, at: Point, width: f64, height: f64, anchor: Anchor);

    fn draw_text(&mut self, text: Text);

    fn set_pen_color(&mut self, color: Rgba);

    fn set_fill_color(&mut self, color: Rgba);

    fn set_line_width(&mut self, width: f64);

    /// Finish the current drawing before axes are drawn.
    fn begin_axes(&mut self, axes: &Axes);

    /// Reset pose, style and history.
    fn start_new_drawing(&mut self);

    fn current_position(&mut self) -> Point;

    fn current_heading(&mut self) -> f64;

    fn backward(&mut self, distance: f64) {
        self.forward(-distance);
    }

    fn right(&mut self, angle: f64) {
        self.left(-angle);
    }

    fn add_arc(&mut self, radius: f64, angle: f64) {
        self.arc(radius, angle);
    }

    fn is_pen_down(&self) -> bool {
        self.turtle().is_pen_down()
    }

    /// Draw a straight line between two points, leaving the turtle at `to`.
    fn draw_line(&mut self, from: Point, to: Point) {
        self.pen_up();
        move_by_diagonal(self, from);
        self.pen_down();
        move_by_diagonal(self, to);
    }

    fn draw_curve(&mut self, curve: &Curve) {
        self.add_curve(curve);
        if curve.show_control_points {
            draw_control_points(self, curve);
        }
    }

    /// Draw a small triangle showing the turtle's pose.
    fn draw_self(&mut self) {
        let was_down = self.is_pen_down();
        self.pen_down();
        self.left(150.0);
        self.forward(10.0);
        self.left(120.0);
        self.forward(10.0);
        self.left(120.0);
        self.forward(10.0);
        self.right(390.0);
        if !was_down {
            self.pen_up();
        }
    }

    /// Draw axes through the origin, then restore style and position.
    fn draw_axes(&mut self, axes: &Axes) {
        let saved_color = self.turtle().pen_color();
        let saved_width = self.turtle().line_width();
        let origin = self.turtle().position();

        self.begin_axes(axes);

        let half_width = axes.width / 2.0;
        let half_height = axes.height / 2.0;
        let scaled = axes.with_scale && axes.by > 0.0 && axes.by.is_finite();
        let (xs, ys) = if scaled {
            (multiples(axes.by, half_width), multiples(axes.by, half_height))
        } else {
            (Vec::new(), Vec::new())
        };

        if scaled {
            self.set_pen_color(axes.color.faded(FAINT));
            self.set_line_width(0.5);
            for &x in &xs {
                self.draw_line(Point::new(x, -half_height), Point::new(x, half_height));
            }
            for &y in &ys {
                self.draw_line(Point::new(-half_width, y), Point::new(half_width, y));
            }
        }

        self.set_pen_color(axes.color);
        self.set_line_width(1.0);
        self.draw_line(Point::new(-half_width, 0.0), Point::new(half_width, 0.0));
        self.draw_line(Point::new(0.0, -half_height), Point::new(0.0, half_height));

        for &x in &xs {
            let position = Point::new(x + 2.0, -LABEL_SIZE - 2.0);
            self.draw_text(label(format_coordinate(x), position, axes.color));
        }
        for &y in &ys {
            let position = Point::new(4.0, y + 2.0);
            self.draw_text(label(format_coordinate(y), position, axes.color));
        }

        self.set_pen_color(saved_color);
        self.set_line_width(saved_width);
        self.pen_up();
        move_by_diagonal(self, origin);
        self.pen_down();
    }
}

/// Diagonal move from wherever the turtle is to `target`.
fn move_by_diagonal<T: TurtleOps + ?Sized>(ops: &mut T, target: Point) {
    let here = ops.turtle().position();
    ops.diagonal(target.x - here.x, target.y - here.y);
}

fn draw_control_points<T: TurtleOps + ?Sized>(ops: &mut T, curve: &Curve) {
    let pen_color = ops.turtle().pen_color();
    let line_width = ops.turtle().line_width();
    let was_down = ops.is_pen_down();

    ops.set_pen_color(pen_color.faded(FAINT));
    ops.set_line_width(1.0);
    ops.draw_line(curve.from, curve.control1);
    ops.draw_line(curve.to, curve.control2);

    let offset = Vec2::new(4.0, 4.0);
    for point in [curve.from, curve.control1, curve.control2, curve.to] {
        let message = format!(
            "({}, {})",
            format_coordinate(point.x),
            format_coordinate(point.y)
        );
        ops.draw_text(label(message, point + offset, pen_color));
    }

    ops.set_pen_color(pen_color);
    ops.set_line_width(line_width);
    ops.pen_up();
    move_by_diagonal(ops, curve.to);
    if was_down {
        ops.pen_down();
    }
}

fn label(message: String, position: Point, color: Rgba) -> Text {
    Text::new(message, position)
        .with_size(LABEL_SIZE)
        .with_color(color)
}

/// Non-zero multiples of `step` within `[-limit, limit]`, nearest first.
fn multiples(step: f64, limit: f64) -> Vec<f64> {
    let mut values = Vec::new();
    for k in 1..=MAX_AXIS_STEPS {
        let value = step * k as f64;
        if value > limit {
            return values;
        }
        values.push(value);
        values.push(-value);
    }
    if step * (MAX_AXIS_STEPS + 1) as f64 <= limit {
        log::warn!("axis grid truncated at {MAX_AXIS_STEPS} steps of {step} (limit {limit})");
    }
    values
}

/// Whole numbers print without a fraction, everything else with one digit.
pub fn format_coordinate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_origin() {
        let at = Point::new(10.0, 10.0);
        assert_eq!(Anchor::BottomLeft.origin(at, 20.0, 40.0), at);
        assert_eq!(Anchor::Centre.origin(at, 20.0, 40.0), Point::new(0.0, -10.0));
    }

    #[test]
    fn test_multiples() {
        assert_eq!(multiples(50.0, 120.0), vec![50.0, -50.0, 100.0, -100.0]);
        assert!(multiples(50.0, 40.0).is_empty());
    }

    #[test]
    fn test_multiples_are_capped() {
        assert_eq!(multiples(0.001, 100.0).len(), 2 * MAX_AXIS_STEPS);
        assert_eq!(multiples(1.0, MAX_AXIS_STEPS as f64).len(), 2 * MAX_AXIS_STEPS);
    }

    #[test]
    fn test_default_axes_are_gray() {
        assert_eq!(Axes::default().color, Rgba::GRAY);
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(50.0), "50");
        assert_eq!(format_coordinate(-2.5), "-2.5");
    }
}
