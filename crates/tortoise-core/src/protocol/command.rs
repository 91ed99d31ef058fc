//! Typed turtle commands and their dictionary wire form.

use std::str::FromStr;

use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::WireValue;
use crate::color::Rgba;
use crate::config::ConfigError;

/// Key naming the command in every command dictionary.
pub const COMMAND_KEY: &str = "Command";

/// Errors raised while decoding a received value.
///
/// None of these are fatal: the receiver reports them and carries on.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("expected a dictionary")]
    NotADictionary,
    #[error("Hmm. I was sent a dictionary, but it was missing a \"Command\".")]
    MissingCommand,
    #[error("Hmm. I don't recognize the command \"{0}\".")]
    UnknownCommand(String),
    #[error("'{command}' command received, but some required information was missing: {detail}")]
    MissingParameters { command: String, detail: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One turtle mutation or notification.
///
/// Serializes to a dictionary whose `"Command"` entry carries the camelCase
/// name and whose remaining entries are the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Forward {
        distance: f64,
    },
    Diagonal {
        dx: f64,
        dy: f64,
    },
    SetHeading {
        from: f64,
        to: f64,
    },
    SetLineWidth {
        from: f64,
        to: f64,
    },
    PenUp,
    PenDown,
    /// Arc whose heading change was already sent as `setHeading`.
    Arc {
        radius: f64,
        angle: f64,
    },
    /// Arc that applies its own heading change.
    ArcWithHeadingDelta {
        radius: f64,
        angle: f64,
    },
    SetPenColor {
        red: f64,
        green: f64,
        blue: f64,
        alpha: f64,
    },
    SetFillColor {
        red: f64,
        green: f64,
        blue: f64,
        alpha: f64,
    },
    DrawText {
        message: String,
        at_x: f64,
        at_y: f64,
        size: f64,
        kerning: f64,
        red: f64,
        green: f64,
        blue: f64,
        alpha: f64,
    },
    DrawRoundedRectangle {
        at_x: f64,
        at_y: f64,
        width: f64,
        height: f64,
        corner_radius: f64,
        anchored_at_bottom_left: bool,
    },
    DrawArc {
        center_x: f64,
        center_y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        clockwise: bool,
    },
    DrawCurve {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
        control1_x: f64,
        control1_y: f64,
        control2_x: f64,
        control2_y: f64,
        show_control_points: bool,
    },
    /// Ellipse with its bottom-left origin already resolved.
    DrawEllipse {
        at_x: f64,
        at_y: f64,
        width: f64,
        height: f64,
    },
    DrawRectangle {
        at_x: f64,
        at_y: f64,
        width: f64,
        height: f64,
        anchored_at_bottom_left: bool,
    },
    DrawAxes {
        with_scale: bool,
        by: f64,
        width: f64,
        height: f64,
        red: f64,
        green: f64,
        blue: f64,
        alpha: f64,
    },
    StartNewDrawing,
    ToggleDebugMode,
    ReportCurrentPosition {
        x: f64,
        y: f64,
    },
    ReportCurrentHeading {
        heading: f64,
    },
    #[serde(rename = "renderDrawingToPDF")]
    RenderDrawingToPdf,
}

impl Command {
    /// Every command name a receiver understands.
    pub const NAMES: &'static [&'static str] = &[
        "forward",
        "diagonal",
        "setHeading",
        "setLineWidth",
        "penUp",
        "penDown",
        "arc",
        "arcWithHeadingDelta",
        "setPenColor",
        "setFillColor",
        "drawText",
        "drawRoundedRectangle",
        "drawArc",
        "drawCurve",
        "drawEllipse",
        "drawRectangle",
        "drawAxes",
        "startNewDrawing",
        "toggleDebugMode",
        "reportCurrentPosition",
        "reportCurrentHeading",
        "renderDrawingToPDF",
    ];

    /// Wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Forward { .. } => "forward",
            Command::Diagonal { .. } => "diagonal",
            Command::SetHeading { .. } => "setHeading",
            Command::SetLineWidth { .. } => "setLineWidth",
            Command::PenUp => "penUp",
            Command::PenDown => "penDown",
            Command::Arc { .. } => "arc",
            Command::ArcWithHeadingDelta { .. } => "arcWithHeadingDelta",
            Command::SetPenColor { .. } => "setPenColor",
            Command::SetFillColor { .. } => "setFillColor",
            Command::DrawText { .. } => "drawText",
            Command::DrawRoundedRectangle { .. } => "drawRoundedRectangle",
            Command::DrawArc { .. } => "drawArc",
            Command::DrawCurve { .. } => "drawCurve",
            Command::DrawEllipse { .. } => "drawEllipse",
            Command::DrawRectangle { .. } => "drawRectangle",
            Command::DrawAxes { .. } => "drawAxes",
            Command::StartNewDrawing => "startNewDrawing",
            Command::ToggleDebugMode => "toggleDebugMode",
            Command::ReportCurrentPosition { .. } => "reportCurrentPosition",
            Command::ReportCurrentHeading { .. } => "reportCurrentHeading",
            Command::RenderDrawingToPdf => "renderDrawingToPDF",
        }
    }

    pub fn set_pen_color(color: Rgba) -> Self {
        let [red, green, blue, alpha] = color.channels();
        Command::SetPenColor { red, green, blue, alpha }
    }

    pub fn set_fill_color(color: Rgba) -> Self {
        let [red, green, blue, alpha] = color.channels();
        Command::SetFillColor { red, green, blue, alpha }
    }

    pub fn report_position(position: Point) -> Self {
        Command::ReportCurrentPosition {
            x: position.x,
            y: position.y,
        }
    }

    /// Encode as a command dictionary.
    pub fn to_value(&self) -> Result<WireValue, ProtocolError> {
        let json = serde_json::to_value(self)?;
        WireValue::from_json(&json).ok_or(ProtocolError::NotADictionary)
    }

    /// Decode a command dictionary.
    pub fn from_value(value: &WireValue) -> Result<Self, ProtocolError> {
        let entries = value.as_dictionary().ok_or(ProtocolError::NotADictionary)?;
        let name = entries
            .get(COMMAND_KEY)
            .and_then(WireValue::as_str)
            .ok_or(ProtocolError::MissingCommand)?;
        if !Self::NAMES.contains(&name) {
            return Err(ProtocolError::UnknownCommand(name.to_string()));
        }
        serde_json::from_value(value.to_json()).map_err(|err| ProtocolError::MissingParameters {
            command: name.to_string(),
            detail: err.to_string(),
        })
    }

    /// Encode as tagged JSON text, the live-view transport frame.
    pub fn to_json_text(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }

    /// Whether applying this command can change what is drawn.
    pub fn changes_drawing(&self) -> bool {
        !matches!(
            self,
            Command::ToggleDebugMode
                | Command::ReportCurrentPosition { .. }
                | Command::ReportCurrentHeading { .. }
                | Command::RenderDrawingToPdf
        )
    }
}

/// How the authoritative turtle transmits `arc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcEncoding {
    /// A single `arcWithHeadingDelta` command.
    #[default]
    Compound,
    /// `setHeading{from, to}` followed by `arc{radius, angle}`. The receiver
    /// has to undo the heading change before replaying the arc.
    Legacy,
}

impl FromStr for ArcEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compound" => Ok(ArcEncoding::Compound),
            "legacy" => Ok(ArcEncoding::Legacy),
            other => Err(ConfigError::Invalid {
                key: "arc encoding".to_string(),
                value: other.to_string(),
                reason: "expected `compound` or `legacy`".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn dictionary(entries: &[(&str, WireValue)]) -> WireValue {
        WireValue::Dictionary(
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_wire_names() {
        let value = Command::DrawCurve {
            from_x: 0.0,
            from_y: 0.0,
            to_x: 1.0,
            to_y: 1.0,
            control1_x: 0.5,
            control1_y: 0.0,
            control2_x: 0.5,
            control2_y: 1.0,
            show_control_points: false,
        }
        .to_value()
        .unwrap();
        let entries = value.as_dictionary().unwrap();
        assert_eq!(entries[COMMAND_KEY], WireValue::from("drawCurve"));
        for key in ["fromX", "toY", "control1X", "control2Y", "showControlPoints"] {
            assert!(entries.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_every_name_matches_variant() {
        let samples = [
            Command::PenUp,
            Command::StartNewDrawing,
            Command::RenderDrawingToPdf,
            Command::ArcWithHeadingDelta { radius: 1.0, angle: 2.0 },
            Command::set_fill_color(Rgba::RED),
        ];
        for command in samples {
            let value = command.to_value().unwrap();
            let entries = value.as_dictionary().unwrap();
            assert_eq!(entries[COMMAND_KEY].as_str(), Some(command.name()));
            assert!(Command::NAMES.contains(&command.name()));
            assert_eq!(Command::from_value(&value).unwrap(), command);
        }
    }

    #[test]
    fn test_integers_decode_as_floats() {
        let value = dictionary(&[
            (COMMAND_KEY, WireValue::from("diagonal")),
            ("dx", WireValue::Integer(3)),
            ("dy", WireValue::FloatingPoint(-4.5)),
        ]);
        assert_eq!(
            Command::from_value(&value).unwrap(),
            Command::Diagonal { dx: 3.0, dy: -4.5 }
        );
    }

    #[test]
    fn test_missing_command_key() {
        let value = dictionary(&[("distance", WireValue::from(1.0))]);
        assert!(matches!(
            Command::from_value(&value),
            Err(ProtocolError::MissingCommand)
        ));
    }

    #[test]
    fn test_unknown_command() {
        let value = dictionary(&[(COMMAND_KEY, WireValue::from("moonwalk"))]);
        let err = Command::from_value(&value).unwrap_err();
        assert_eq!(err.to_string(), "Hmm. I don't recognize the command \"moonwalk\".");
    }

    #[test]
    fn test_missing_parameter() {
        let value = dictionary(&[(COMMAND_KEY, WireValue::from("forward"))]);
        match Command::from_value(&value) {
            Err(ProtocolError::MissingParameters { command, .. }) => assert_eq!(command, "forward"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_a_dictionary() {
        assert!(matches!(
            Command::from_value(&WireValue::from(1.0)),
            Err(ProtocolError::NotADictionary)
        ));
    }

    #[test]
    fn test_extra_parameters_are_ignored() {
        let value = dictionary(&[
            (COMMAND_KEY, WireValue::from("penDown")),
            ("note", WireValue::from("ignored")),
        ]);
        assert_eq!(Command::from_value(&value).unwrap(), Command::PenDown);
    }

    #[test]
    fn test_arc_encoding_from_str() {
        assert_eq!("Legacy".parse::<ArcEncoding>().unwrap(), ArcEncoding::Legacy);
        assert_eq!(" compound ".parse::<ArcEncoding>().unwrap(), ArcEncoding::Compound);
        assert!("both".parse::<ArcEncoding>().is_err());
    }
}
