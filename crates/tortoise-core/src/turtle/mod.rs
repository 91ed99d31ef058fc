//! Turtle pose, pen and path state.

mod ops;

pub use ops::{Anchor, Axes, CircularArc, Curve, TurtleOps, format_coordinate};

use kurbo::{Ellipse, Point, Rect, RoundedRect, Size};
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::drawing::{Drawing, Text};
use crate::path::TurtlePath;

/// Line width of a fresh turtle.
pub const DEFAULT_LINE_WIDTH: f64 = 3.0;
/// Pen color of a fresh turtle.
pub const DEFAULT_PEN_COLOR: Rgba = Rgba::BLUE;
/// Fill color of a fresh turtle.
pub const DEFAULT_FILL_COLOR: Rgba = Rgba::CLEAR;

/// The turtle's complete state.
///
/// A plain value: copies are independent, and the only way to share a turtle
/// is to hand over a clone. Style attributes are private so that every change
/// goes through a setter that finishes the current drawing first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turtle {
    path: TurtlePath,
    /// Degrees, counter-clockwise from the positive x axis. Never wrapped.
    heading: f64,
    pen_down: bool,
    pen_color: Rgba,
    fill_color: Rgba,
    line_width: f64,
    drawings: Vec<Drawing>,
}

impl Default for Turtle {
    fn default() -> Self {
        Self::new()
    }
}

impl Turtle {
    /// A turtle at the origin facing along the positive x axis.
    pub fn new() -> Self {
        Self {
            path: TurtlePath::starting_at(Point::ZERO),
            heading: 0.0,
            pen_down: true,
            pen_color: DEFAULT_PEN_COLOR,
            fill_color: DEFAULT_FILL_COLOR,
            line_width: DEFAULT_LINE_WIDTH,
            drawings: Vec::new(),
        }
    }

    pub fn position(&self) -> Point {
        self.path.current_point()
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    pub fn pen_color(&self) -> Rgba {
        self.pen_color
    }

    pub fn fill_color(&self) -> Rgba {
        self.fill_color
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    /// The live path, drawn on top of every finished drawing.
    pub fn path(&self) -> &TurtlePath {
        &self.path
    }

    /// Finished drawings, oldest first.
    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    /// The live path and current style as a drawing.
    pub fn snapshot(&self) -> Drawing {
        Drawing {
            path: self.path.clone(),
            position: self.position(),
            fill_color: self.fill_color,
            stroke_color: self.pen_color,
            line_width: self.line_width,
            text: None,
        }
    }

    /// Freeze the live path into the history and restart it where the pen is.
    pub fn finish_drawing(&mut self) {
        let drawing = self.snapshot();
        self.drawings.push(drawing);
        self.path = TurtlePath::starting_at(self.position());
    }

    fn step(&mut self, dx: f64, dy: f64) {
        let here = self.position();
        let target = Point::new(here.x + dx, here.y + dy);
        if self.pen_down {
            self.path.line_to(target);
        } else {
            self.path.move_to(target);
        }
    }
}

impl TurtleOps for Turtle {
    fn turtle(&self) -> &Turtle {
        self
    }

    fn forward(&mut self, distance: f64) {
        let heading = self.heading.to_radians();
        self.step(distance * heading.cos(), distance * heading.sin());
    }

    fn diagonal(&mut self, dx: f64, dy: f64) {
        self.step(dx, dy);
    }

    fn left(&mut self, angle: f64) {
        self.heading += angle;
    }

    fn set_heading(&mut self, heading: f64) {
        self.heading = heading;
    }

    fn pen_up(&mut self) {
        self.pen_down = false;
    }

    fn pen_down(&mut self) {
        self.pen_down = true;
    }

    fn arc(&mut self, radius: f64, angle: f64) {
        let here = self.position();
        let heading = self.heading;

        let (center, start, end, clockwise) = if angle < 0.0 {
            let to_center = (90.0 - heading).to_radians();
            let center = Point::new(
                here.x + radius * to_center.cos(),
                here.y - radius * to_center.sin(),
            );
            (center, 90.0 + heading, 90.0 + heading + angle, false)
        } else {
            let to_center = (90.0 + heading).to_radians();
            let center = Point::new(
                here.x + radius * to_center.cos(),
                here.y + radius * to_center.sin(),
            );
            (center, -90.0 + heading, -90.0 + heading + angle, true)
        };

        self.heading += angle;
        self.path
            .add_arc(center, radius, start.to_radians(), end.to_radians(), clockwise);
    }

    fn draw_arc(&mut self, arc: &CircularArc) {
        self.path.add_arc(
            arc.center,
            arc.radius,
            arc.start_angle.to_radians(),
            arc.end_angle.to_radians(),
            arc.clockwise,
        );
    }

    fn add_curve(&mut self, curve: &Curve) {
        self.path.move_to(curve.from);
        self.path.curve_to(curve.control1, curve.control2, curve.to);
    }

    fn draw_rectangle(&mut self, at: Point, width: f64, height: f64, anchor: Anchor) {
        self.path.append_closed(&anchored_rect(at, width, height, anchor));
    }

    fn draw_rounded_rectangle(
        &mut self,
        at: Point,
        width: f64,
        height: f64,
        corner_radius: f64,
        anchor: Anchor,
    ) {
        self.finish_drawing();
        let rect = anchored_rect(at, width, height, anchor);
        self.path
            .append_closed(&RoundedRect::from_rect(rect, corner_radius));
    }

    fn draw_ellipse(&mut self, at: Point, width: f64, height: f64, anchor: Anchor) {
        let rect = anchored_rect(at, width, height, anchor);
        self.path.append_closed(&Ellipse::from_rect(rect));
    }

    fn draw_text(&mut self, text: Text) {
        self.finish_drawing();
        let mut drawing = self.snapshot();
        drawing.text = Some(text);
        self.drawings.push(drawing);
    }

    fn set_pen_color(&mut self, color: Rgba) {
        self.finish_drawing();
        self.pen_color = color;
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.finish_drawing();
        self.fill_color = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.finish_drawing();
        self.line_width = width;
    }

    fn begin_axes(&mut self, _axes: &Axes) {
        self.finish_drawing();
    }

    fn start_new_drawing(&mut self) {
        *self = Turtle::new();
    }

    fn current_position(&mut self) -> Point {
        self.position()
    }

    fn current_heading(&mut self) -> f64 {
        self.heading
    }
}

fn anchored_rect(at: Point, width: f64, height: f64, anchor: Anchor) -> Rect {
    Rect::from_origin_size(anchor.origin(at, width, height), Size::new(width, height))
}
