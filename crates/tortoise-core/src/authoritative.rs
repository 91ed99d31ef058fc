//! The sending turtle: applies each mutation locally, then transmits it.

use kurbo::Point;

use crate::channel::CommandSink;
use crate::color::Rgba;
use crate::config::TurtleConfig;
use crate::drawing::Text;
use crate::protocol::{ArcEncoding, Command};
use crate::turtle::{Anchor, Axes, CircularArc, Curve, Turtle, TurtleOps};

/// A turtle driven by user code whose every mutation is mirrored to a live
/// view through the injected sink.
///
/// Transmission failures are logged and otherwise ignored so that a broken
/// live view never stops the program.
pub struct AuthoritativeTurtle<S: CommandSink> {
    turtle: Turtle,
    sink: S,
    config: TurtleConfig,
}

impl<S: CommandSink> AuthoritativeTurtle<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, TurtleConfig::default())
    }

    pub fn with_config(sink: S, config: TurtleConfig) -> Self {
        Self {
            turtle: Turtle::new(),
            sink,
            config,
        }
    }

    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give back the final state and the sink.
    pub fn into_parts(self) -> (Turtle, S) {
        (self.turtle, self.sink)
    }

    /// Reset both sides before the user program runs.
    pub fn start(&mut self) {
        self.start_new_drawing();
    }

    /// Ask the live view to flip its debug mode.
    pub fn toggle_debug_mode(&mut self) {
        self.emit(Command::ToggleDebugMode);
    }

    /// Ask the live view's host to export the drawing.
    pub fn render_drawing_to_pdf(&mut self) {
        self.emit(Command::RenderDrawingToPdf);
    }

    fn emit(&mut self, command: Command) {
        let name = command.name();
        let value = match command.to_value() {
            Ok(value) => value,
            Err(err) => {
                log::warn!("could not encode '{name}': {err}");
                return;
            }
        };
        if let Err(err) = self.sink.send(value) {
            log::warn!("could not send '{name}' to the live view: {err}");
        }
    }
}

impl<S: CommandSink> TurtleOps for AuthoritativeTurtle<S> {
    fn turtle(&self) -> &Turtle {
        &self.turtle
    }

    fn forward(&mut self, distance: f64) {
        self.turtle.forward(distance);
        self.emit(Command::Forward { distance });
    }

    fn diagonal(&mut self, dx: f64, dy: f64) {
        self.turtle.diagonal(dx, dy);
        self.emit(Command::Diagonal { dx, dy });
    }

    fn left(&mut self, angle: f64) {
        let from = self.turtle.heading();
        self.turtle.left(angle);
        let to = self.turtle.heading();
        self.emit(Command::SetHeading { from, to });
    }

    fn set_heading(&mut self, heading: f64) {
        let from = self.turtle.heading();
        self.turtle.set_heading(heading);
        self.emit(Command::SetHeading { from, to: heading });
    }

    fn pen_up(&mut self) {
        self.turtle.pen_up();
        self.emit(Command::PenUp);
    }

    fn pen_down(&mut self) {
        self.turtle.pen_down();
        self.emit(Command::PenDown);
    }

    fn arc(&mut self, radius: f64, angle: f64) {
        let from = self.turtle.heading();
        self.turtle.arc(radius, angle);
        match self.config.arc_encoding {
            ArcEncoding::Compound => self.emit(Command::ArcWithHeadingDelta { radius, angle }),
            ArcEncoding::Legacy => {
                let to = self.turtle.heading();
                self.emit(Command::SetHeading { from, to });
                self.emit(Command::Arc { radius, angle });
            }
        }
    }

    fn draw_arc(&mut self, arc: &CircularArc) {
        self.turtle.draw_arc(arc);
        self.emit(Command::DrawArc {
            center_x: arc.center.x,
            center_y: arc.center.y,
            radius: arc.radius,
            start_angle: arc.start_angle,
            end_angle: arc.end_angle,
            clockwise: arc.clockwise,
        });
    }

    fn add_curve(&mut self, curve: &Curve) {
        self.turtle.add_curve(curve);
        self.emit(Command::DrawCurve {
            from_x: curve.from.x,
            from_y: curve.from.y,
            to_x: curve.to.x,
            to_y: curve.to.y,
            control1_x: curve.control1.x,
            control1_y: curve.control1.y,
            control2_x: curve.control2.x,
            control2_y: curve.control2.y,
            show_control_points: curve.show_control_points,
        });
    }

    fn draw_rectangle(&mut self, at: Point, width: f64, height: f64, anchor: Anchor) {
        self.turtle.draw_rectangle(at, width, height, anchor);
        self.emit(Command::DrawRectangle {
            at_x: at.x,
            at_y: at.y,
            width,
            height,
            anchored_at_bottom_left: anchor.is_bottom_left(),
        });
    }

    fn draw_rounded_rectangle(
        &mut self,
        at: Point,
        width: f64,
        height: f64,
        corner_radius: f64,
        anchor: Anchor,
    ) {
        self.turtle
            .draw_rounded_rectangle(at, width, height, corner_radius, anchor);
        self.emit(Command::DrawRoundedRectangle {
            at_x: at.x,
            at_y: at.y,
            width,
            height,
            corner_radius,
            anchored_at_bottom_left: anchor.is_bottom_left(),
        });
    }

    fn draw_ellipse(&mut self, at: Point, width: f64, height: f64, anchor: Anchor) {
        self.turtle.draw_ellipse(at, width, height, anchor);
        let origin = anchor.origin(at, width, height);
        self.emit(Command::DrawEllipse {
            at_x: origin.x,
            at_y: origin.y,
            width,
            height,
        });
    }

    fn draw_text(&mut self, text: Text) {
        let [red, green, blue, alpha] = text.color.channels();
        let command = Command::DrawText {
            message: text.message.clone(),
            at_x: text.position.x,
            at_y: text.position.y,
            size: text.size,
            kerning: text.kerning,
            red,
            green,
            blue,
            alpha,
        };
        self.turtle.draw_text(text);
        self.emit(command);
    }

    fn set_pen_color(&mut self, color: Rgba) {
        self.turtle.set_pen_color(color);
        self.emit(Command::set_pen_color(color));
    }

    fn set_fill_color(&mut self, color: Rgba) {
        self.turtle.set_fill_color(color);
        self.emit(Command::set_fill_color(color));
    }

    fn set_line_width(&mut self, width: f64) {
        let from = self.turtle.line_width();
        self.turtle.set_line_width(width);
        self.emit(Command::SetLineWidth { from, to: width });
    }

    fn begin_axes(&mut self, axes: &Axes) {
        self.turtle.begin_axes(axes);
        let [red, green, blue, alpha] = axes.color.channels();
        self.emit(Command::DrawAxes {
            with_scale: axes.with_scale,
            by: axes.by,
            width: axes.width,
            height: axes.height,
            red,
            green,
            blue,
            alpha,
        });
    }

    fn start_new_drawing(&mut self) {
        self.turtle.start_new_drawing();
        self.emit(Command::StartNewDrawing);
    }

    fn current_position(&mut self) -> Point {
        let position = self.turtle.position();
        if self.config.report_queries {
            self.emit(Command::report_position(position));
        }
        position
    }

    fn current_heading(&mut self) -> f64 {
        let heading = self.turtle.heading();
        if self.config.report_queries {
            self.emit(Command::ReportCurrentHeading { heading });
        }
        heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelError, LocalLink, Outbox};
    use crate::liveview::LiveView;
    use crate::protocol::WireValue;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn names(outbox: &mut Outbox) -> Vec<String> {
        outbox
            .take_outgoing()
            .iter()
            .map(|value| Command::from_value(value).unwrap().name().to_string())
            .collect()
    }

    fn legacy() -> TurtleConfig {
        TurtleConfig {
            arc_encoding: ArcEncoding::Legacy,
            ..TurtleConfig::default()
        }
    }

    fn replay(turtle: &AuthoritativeTurtle<LocalLink>) -> Turtle {
        turtle.sink().view().borrow().turtle().clone()
    }

    fn local() -> AuthoritativeTurtle<LocalLink> {
        AuthoritativeTurtle::new(LocalLink::new(Rc::new(RefCell::new(LiveView::new()))))
    }

    #[test]
    fn test_mutates_locally_then_emits() {
        let mut turtle = AuthoritativeTurtle::new(Outbox::new());
        turtle.forward(10.0);
        turtle.right(90.0);
        turtle.set_line_width(5.0);
        assert_eq!(turtle.turtle().line_width(), 5.0);
        assert_eq!(turtle.turtle().drawings().len(), 1);

        let sent = turtle.sink_mut().take_outgoing();
        assert_eq!(Command::from_value(&sent[0]).unwrap(), Command::Forward { distance: 10.0 });
        assert_eq!(
            Command::from_value(&sent[1]).unwrap(),
            Command::SetHeading { from: 0.0, to: -90.0 }
        );
        assert_eq!(
            Command::from_value(&sent[2]).unwrap(),
            Command::SetLineWidth { from: 3.0, to: 5.0 }
        );
    }

    #[test]
    fn test_compound_arc_is_one_command() {
        let mut turtle = AuthoritativeTurtle::new(Outbox::new());
        turtle.arc(20.0, 45.0);
        assert_eq!(names(turtle.sink_mut()), ["arcWithHeadingDelta"]);
    }

    #[test]
    fn test_legacy_arc_stream() {
        let mut turtle = AuthoritativeTurtle::with_config(Outbox::new(), legacy());
        turtle.forward(50.0);
        turtle.left(90.0);
        turtle.arc(20.0, -90.0);
        let sent: Vec<Command> = turtle
            .sink_mut()
            .take_outgoing()
            .iter()
            .map(|value| Command::from_value(value).unwrap())
            .collect();
        assert_eq!(
            sent,
            [
                Command::Forward { distance: 50.0 },
                Command::SetHeading { from: 0.0, to: 90.0 },
                Command::SetHeading { from: 90.0, to: 0.0 },
                Command::Arc { radius: 20.0, angle: -90.0 },
            ]
        );
    }

    #[test]
    fn test_replica_converges_with_both_encodings() {
        for config in [TurtleConfig::default(), legacy()] {
            let view = Rc::new(RefCell::new(LiveView::new()));
            let link = LocalLink::new(Rc::clone(&view));
            let mut turtle = AuthoritativeTurtle::with_config(link, config);
            turtle.start();
            turtle.forward(50.0);
            turtle.left(30.0);
            turtle.arc(40.0, 120.0);
            turtle.arc(15.0, -200.0);
            turtle.set_pen_color(Rgba::RED);
            turtle.diagonal(-10.0, 5.0);

            let replica = view.borrow().turtle().clone();
            assert!(replica.position().distance(turtle.turtle().position()) < 1e-9);
            assert!((replica.heading() - turtle.turtle().heading()).abs() < 1e-9);
            assert_eq!(replica.drawings().len(), turtle.turtle().drawings().len());
        }
    }

    fn draw_shapes<T: TurtleOps>(turtle: &mut T) {
        turtle.set_fill_color(Rgba::RED.with_alpha(0.5));
        turtle.draw_arc(&CircularArc {
            center: Point::new(10.0, -10.0),
            radius: 25.0,
            start_angle: 30.0,
            end_angle: 200.0,
            clockwise: false,
        });
        turtle.draw_rectangle(Point::new(-20.0, 15.0), 40.0, 30.0, Anchor::Centre);
        turtle.draw_ellipse(Point::new(50.0, 50.0), 30.0, 20.0, Anchor::Centre);
        turtle.forward(12.0);
    }

    #[test]
    fn test_shape_primitives_cross_the_wire() {
        let mut turtle = AuthoritativeTurtle::new(Outbox::new());
        draw_shapes(&mut turtle);
        assert_eq!(
            names(turtle.sink_mut()),
            ["setFillColor", "drawArc", "drawRectangle", "drawEllipse", "forward"]
        );
    }

    #[test]
    fn test_shape_primitives_replicate() {
        for config in [TurtleConfig::default(), legacy()] {
            let view = Rc::new(RefCell::new(LiveView::new()));
            let link = LocalLink::new(Rc::clone(&view));
            let mut turtle = AuthoritativeTurtle::with_config(link, config);
            turtle.forward(5.0);
            turtle.arc(30.0, 45.0);
            draw_shapes(&mut turtle);

            let replica = replay(&turtle);
            assert_eq!(replica.fill_color(), Rgba::RED.with_alpha(0.5));
            assert_eq!(&replica, turtle.turtle());
        }
    }

    #[test]
    fn test_compound_operations_replicate() {
        let mut turtle = local();
        draw_shapes(&mut turtle);
        turtle.draw_axes(&Axes::default());
        turtle.draw_curve(&Curve {
            from: Point::new(0.0, 0.0),
            to: Point::new(60.0, 0.0),
            control1: Point::new(10.0, 40.0),
            control2: Point::new(50.0, 40.0),
            show_control_points: true,
        });
        turtle.draw_self();
        turtle.draw_ellipse(Point::new(0.0, 0.0), 30.0, 20.0, Anchor::Centre);
        turtle.draw_rounded_rectangle(
            Point::new(5.0, 5.0),
            30.0,
            20.0,
            3.0,
            Anchor::BottomLeft,
        );
        turtle.draw_text(Text::new("hi", Point::new(1.0, 1.0)).with_color(Rgba::RED));

        let replica = replay(&turtle);
        assert_eq!(&replica, turtle.turtle());
    }

    #[test]
    fn test_queries_report() {
        let mut turtle = AuthoritativeTurtle::new(Outbox::new());
        turtle.forward(3.0);
        assert_eq!(turtle.current_position(), Point::new(3.0, 0.0));
        assert_eq!(turtle.current_heading(), 0.0);
        assert_eq!(
            names(turtle.sink_mut()),
            ["forward", "reportCurrentPosition", "reportCurrentHeading"]
        );

        let quiet = TurtleConfig {
            report_queries: false,
            ..TurtleConfig::default()
        };
        let mut turtle = AuthoritativeTurtle::with_config(Outbox::new(), quiet);
        turtle.current_position();
        assert!(turtle.sink().is_empty());
    }

    #[test]
    fn test_notifications() {
        let mut turtle = AuthoritativeTurtle::new(Outbox::new());
        turtle.toggle_debug_mode();
        turtle.render_drawing_to_pdf();
        assert_eq!(names(turtle.sink_mut()), ["toggleDebugMode", "renderDrawingToPDF"]);
        assert_eq!(turtle.turtle(), &Turtle::new());
    }

    struct BrokenSink;

    impl CommandSink for BrokenSink {
        fn send(&mut self, _value: WireValue) -> Result<(), ChannelError> {
            Err(ChannelError::Closed)
        }
    }

    #[test]
    fn test_send_failure_does_not_stop_the_program() {
        let mut turtle = AuthoritativeTurtle::new(BrokenSink);
        turtle.forward(10.0);
        turtle.left(90.0);
        turtle.forward(10.0);
        let (state, _) = turtle.into_parts();
        assert!(state.position().distance(Point::new(10.0, 10.0)) < 1e-9);
    }
}
