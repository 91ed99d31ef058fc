//! Retained-mode path with a tracked current point.

use std::f64::consts::TAU;

use kurbo::{Arc, BezPath, ParamCurveArclen, PathEl, Point, Shape, Vec2};
use serde::{Deserialize, Serialize};

/// Flattening tolerance used when converting arcs and shapes to curves.
pub const PATH_TOLERANCE: f64 = 0.1;

/// A bezier path that remembers where the pen currently is.
///
/// The current point is where the next segment starts. Moves change it
/// without adding drawable length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtlePath {
    path: BezPath,
    current: Point,
}

impl Default for TurtlePath {
    fn default() -> Self {
        Self::new()
    }
}

impl TurtlePath {
    /// Create an empty path. The current point is the origin.
    pub fn new() -> Self {
        Self {
            path: BezPath::new(),
            current: Point::ZERO,
        }
    }

    /// Create a path whose only element is a move to `point`.
    pub fn starting_at(point: Point) -> Self {
        let mut path = Self::new();
        path.move_to(point);
        path
    }

    pub fn current_point(&self) -> Point {
        self.current
    }

    /// The underlying kurbo path.
    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    pub fn elements(&self) -> &[PathEl] {
        self.path.elements()
    }

    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    /// Whether the path contains anything besides moves.
    pub fn has_drawing(&self) -> bool {
        self.path
            .elements()
            .iter()
            .any(|el| !matches!(el, PathEl::MoveTo(_)))
    }

    /// Total length of every drawn segment.
    pub fn drawn_length(&self) -> f64 {
        self.path.segments().map(|seg| seg.arclen(1e-6)).sum()
    }

    pub fn move_to(&mut self, point: Point) {
        self.path.move_to(point);
        self.current = point;
    }

    pub fn line_to(&mut self, point: Point) {
        if self.is_empty() {
            self.path.move_to(self.current);
        }
        self.path.line_to(point);
        self.current = point;
    }

    pub fn curve_to(&mut self, control1: Point, control2: Point, to: Point) {
        if self.is_empty() {
            self.path.move_to(self.current);
        }
        self.path.curve_to(control1, control2, to);
        self.current = to;
    }

    /// Append a circular arc. Angles are in radians.
    ///
    /// `clockwise` sweeps with increasing angle, otherwise the sweep runs
    /// with decreasing angle. A straight segment joins the current point to
    /// the start of the arc; on an empty path the arc start becomes the
    /// first point instead.
    pub fn add_arc(&mut self, center: Point, radius: f64, start: f64, end: f64, clockwise: bool) {
        let sweep = arc_sweep(start, end, clockwise);
        let start_point = center + Vec2::from_angle(start) * radius;

        if self.is_empty() {
            self.path.move_to(start_point);
        } else if self.current.distance(start_point) > 1e-9 {
            self.path.line_to(start_point);
        }

        let arc = Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: sweep,
            x_rotation: 0.0,
        };
        self.path.extend(arc.append_iter(PATH_TOLERANCE));
        self.current = center + Vec2::from_angle(start + sweep) * radius;
    }

    /// Append a closed sub-path such as a rectangle or an ellipse.
    ///
    /// Afterwards the current point is the start of the appended sub-path.
    pub fn append_closed(&mut self, shape: &impl Shape) {
        let mut start = None;
        for el in shape.path_elements(PATH_TOLERANCE) {
            if let (None, PathEl::MoveTo(p)) = (start, el) {
                start = Some(p);
            }
            self.path.push(el);
        }
        if let Some(p) = start {
            self.current = p;
        }
    }
}

/// Signed sweep for an arc from `start` to `end`, wrapped to at most one turn.
fn arc_sweep(start: f64, end: f64, clockwise: bool) -> f64 {
    let sweep = end - start;
    if clockwise {
        if sweep >= TAU {
            TAU
        } else if sweep < 0.0 {
            sweep.rem_euclid(TAU)
        } else {
            sweep
        }
    } else if sweep <= -TAU {
        -TAU
    } else if sweep > 0.0 {
        sweep.rem_euclid(TAU) - TAU
    } else {
        sweep
    }
}
