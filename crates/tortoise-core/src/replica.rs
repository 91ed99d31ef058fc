//! The receiving turtle: replays decoded commands onto its own state.

use kurbo::Point;

use crate::color::Rgba;
use crate::drawing::Text;
use crate::protocol::{Command, ProtocolError, WireValue};
use crate::turtle::{Anchor, Axes, CircularArc, Curve, Turtle, TurtleOps};

/// Something the host has to act on after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEffect {
    /// The drawing was reset.
    NewDrawingStarted,
    /// Debug mode should flip.
    DebugModeToggled,
    /// The host should export the current drawing.
    ExportRequested,
}

/// Outcome of applying one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub command: &'static str,
    pub changed_drawing: bool,
    pub effect: Option<HostEffect>,
}

/// Undo of a heading change that was already replayed.
///
/// A legacy `arc` is preceded by a `setHeading` carrying the arc's heading
/// delta. Replaying the arc would add that delta a second time, so the
/// heading is rolled back by the swept angle first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingCompensation {
    pub angle: f64,
}

impl HeadingCompensation {
    pub fn for_arc(angle: f64) -> Self {
        Self { angle }
    }

    pub fn apply(self, turtle: &mut Turtle) {
        let heading = turtle.heading();
        turtle.set_heading(heading - self.angle);
    }
}

/// A turtle that only applies commands and never transmits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicaTurtle {
    turtle: Turtle,
}

impl ReplicaTurtle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turtle(&self) -> &Turtle {
        &self.turtle
    }

    /// Decode and apply a received value.
    pub fn apply_value(&mut self, value: &WireValue) -> Result<Applied, ProtocolError> {
        let command = Command::from_value(value)?;
        Ok(self.apply(&command))
    }

    pub fn apply(&mut self, command: &Command) -> Applied {
        log::debug!("applying {command:?}");
        let turtle = &mut self.turtle;
        let mut effect = None;

        match *command {
            Command::Forward { distance } => turtle.forward(distance),
            Command::Diagonal { dx, dy } => turtle.diagonal(dx, dy),
            Command::SetHeading { to, .. } => turtle.set_heading(to),
            Command::SetLineWidth { to, .. } => turtle.set_line_width(to),
            Command::PenUp => turtle.pen_up(),
            Command::PenDown => turtle.pen_down(),
            Command::Arc { radius, angle } => {
                HeadingCompensation::for_arc(angle).apply(turtle);
                turtle.arc(radius, angle);
            }
            Command::ArcWithHeadingDelta { radius, angle } => turtle.arc(radius, angle),
            Command::SetPenColor { red, green, blue, alpha } => {
                turtle.set_pen_color(Rgba::new(red, green, blue, alpha));
            }
            Command::SetFillColor { red, green, blue, alpha } => {
                turtle.set_fill_color(Rgba::new(red, green, blue, alpha));
            }
            Command::DrawText {
                ref message,
                at_x,
                at_y,
                size,
                kerning,
                red,
                green,
                blue,
                alpha,
            } => turtle.draw_text(
                Text::new(message.clone(), Point::new(at_x, at_y))
                    .with_size(size)
                    .with_kerning(kerning)
                    .with_color(Rgba::new(red, green, blue, alpha)),
            ),
            Command::DrawRoundedRectangle {
                at_x,
                at_y,
                width,
                height,
                corner_radius,
                anchored_at_bottom_left,
            } => turtle.draw_rounded_rectangle(
                Point::new(at_x, at_y),
                width,
                height,
                corner_radius,
                Anchor::from_bottom_left(anchored_at_bottom_left),
            ),
            Command::DrawArc {
                center_x,
                center_y,
                radius,
                start_angle,
                end_angle,
                clockwise,
            } => turtle.draw_arc(&CircularArc {
                center: Point::new(center_x, center_y),
                radius,
                start_angle,
                end_angle,
                clockwise,
            }),
            Command::DrawCurve {
                from_x,
                from_y,
                to_x,
                to_y,
                control1_x,
                control1_y,
                control2_x,
                control2_y,
                show_control_points,
            } => turtle.add_curve(&Curve {
                from: Point::new(from_x, from_y),
                to: Point::new(to_x, to_y),
                control1: Point::new(control1_x, control1_y),
                control2: Point::new(control2_x, control2_y),
                show_control_points,
            }),
            Command::DrawEllipse { at_x, at_y, width, height } => {
                turtle.draw_ellipse(Point::new(at_x, at_y), width, height, Anchor::BottomLeft);
            }
            Command::DrawRectangle {
                at_x,
                at_y,
                width,
                height,
                anchored_at_bottom_left,
            } => turtle.draw_rectangle(
                Point::new(at_x, at_y),
                width,
                height,
                Anchor::from_bottom_left(anchored_at_bottom_left),
            ),
            // Grid, axes and labels arrive as primitives of their own.
            Command::DrawAxes {
                with_scale,
                by,
                width,
                height,
                red,
                green,
                blue,
                alpha,
            } => turtle.begin_axes(&Axes {
                with_scale,
                by,
                width,
                height,
                color: Rgba::new(red, green, blue, alpha),
            }),
            Command::StartNewDrawing => {
                turtle.start_new_drawing();
                effect = Some(HostEffect::NewDrawingStarted);
            }
            Command::ToggleDebugMode => effect = Some(HostEffect::DebugModeToggled),
            Command::ReportCurrentPosition { .. } | Command::ReportCurrentHeading { .. } => {}
            Command::RenderDrawingToPdf => effect = Some(HostEffect::ExportRequested),
        }

        Applied {
            command: command.name(),
            changed_drawing: command.changes_drawing(),
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn command(name: &str, params: &[(&str, f64)]) -> WireValue {
        let mut entries = BTreeMap::new();
        entries.insert("Command".to_string(), WireValue::from(name));
        for (key, value) in params {
            entries.insert(key.to_string(), WireValue::from(*value));
        }
        WireValue::Dictionary(entries)
    }

    fn assert_same_pose(a: &Turtle, b: &Turtle) {
        assert!(
            a.position().distance(b.position()) < 1e-9,
            "{:?} vs {:?}",
            a.position(),
            b.position()
        );
        assert!((a.heading() - b.heading()).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_arc_replay_matches_direct() {
        let mut replica = ReplicaTurtle::new();
        for value in [
            command("forward", &[("distance", 50.0)]),
            command("setHeading", &[("from", 0.0), ("to", 90.0)]),
            command("setHeading", &[("from", 90.0), ("to", 0.0)]),
            command("arc", &[("radius", 20.0), ("angle", -90.0)]),
        ] {
            replica.apply_value(&value).unwrap();
        }

        let mut direct = Turtle::new();
        direct.forward(50.0);
        direct.left(90.0);
        direct.arc(20.0, -90.0);

        assert_same_pose(replica.turtle(), &direct);
        assert_eq!(replica.turtle().heading(), 0.0);
    }

    #[test]
    fn test_uncompensated_arc_is_applied_literally() {
        let mut replica = ReplicaTurtle::new();
        for value in [
            command("forward", &[("distance", 50.0)]),
            command("setHeading", &[("from", 0.0), ("to", 90.0)]),
            command("arc", &[("radius", 20.0), ("angle", -90.0)]),
        ] {
            replica.apply_value(&value).unwrap();
        }

        let mut expected = Turtle::new();
        expected.forward(50.0);
        expected.set_heading(180.0);
        expected.arc(20.0, -90.0);

        assert_same_pose(replica.turtle(), &expected);
        assert_eq!(replica.turtle().heading(), 90.0);
    }

    #[test]
    fn test_compound_arc_needs_no_compensation() {
        let mut replica = ReplicaTurtle::new();
        replica
            .apply_value(&command("arcWithHeadingDelta", &[("radius", 10.0), ("angle", 90.0)]))
            .unwrap();

        let mut direct = Turtle::new();
        direct.arc(10.0, 90.0);
        assert_same_pose(replica.turtle(), &direct);
    }

    #[test]
    fn test_heading_compensation() {
        let mut turtle = Turtle::new();
        turtle.set_heading(45.0);
        HeadingCompensation::for_arc(-90.0).apply(&mut turtle);
        assert_eq!(turtle.heading(), 135.0);
    }

    #[test]
    fn test_style_commands_finish_drawings() {
        let mut replica = ReplicaTurtle::new();
        replica.apply_value(&command("forward", &[("distance", 50.0)])).unwrap();
        let applied = replica
            .apply_value(&command(
                "setPenColor",
                &[("red", 1.0), ("green", 0.0), ("blue", 0.0), ("alpha", 1.0)],
            ))
            .unwrap();
        assert!(applied.changed_drawing);
        assert_eq!(replica.turtle().drawings().len(), 1);
        assert_eq!(replica.turtle().pen_color(), Rgba::RED);

        replica
            .apply_value(&command("setLineWidth", &[("from", 3.0), ("to", 8.0)]))
            .unwrap();
        assert_eq!(replica.turtle().drawings().len(), 2);
        assert_eq!(replica.turtle().line_width(), 8.0);
    }

    #[test]
    fn test_draw_axes_only_finishes_drawing() {
        let mut replica = ReplicaTurtle::new();
        replica.apply(&Command::DrawAxes {
            with_scale: true,
            by: 50.0,
            width: 400.0,
            height: 400.0,
            red: 0.0,
            green: 0.0,
            blue: 0.0,
            alpha: 1.0,
        });
        assert_eq!(replica.turtle().drawings().len(), 1);
        assert!(!replica.turtle().path().has_drawing());
    }

    #[test]
    fn test_notifications_leave_drawing_alone() {
        let mut replica = ReplicaTurtle::new();
        let applied = replica.apply(&Command::ReportCurrentHeading { heading: 12.0 });
        assert!(!applied.changed_drawing);
        assert_eq!(applied.effect, None);
        assert_eq!(replica.turtle(), &Turtle::new());

        let applied = replica.apply(&Command::RenderDrawingToPdf);
        assert_eq!(applied.effect, Some(HostEffect::ExportRequested));
    }

    #[test]
    fn test_start_new_drawing_resets() {
        let mut replica = ReplicaTurtle::new();
        replica.apply(&Command::Forward { distance: 10.0 });
        replica.apply(&Command::SetLineWidth { from: 3.0, to: 1.0 });
        let applied = replica.apply(&Command::StartNewDrawing);
        assert_eq!(applied.effect, Some(HostEffect::NewDrawingStarted));
        assert_eq!(replica.turtle(), &Turtle::new());
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let mut replica = ReplicaTurtle::new();
        assert!(replica.apply_value(&command("forward", &[])).is_err());
        assert_eq!(replica.turtle(), &Turtle::new());
    }
}
