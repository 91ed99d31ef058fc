//! The live view's receiving side: dispatch, diagnostics and debug replies.

use crate::protocol::{COMMAND_KEY, Command, ProtocolError, WireValue};
use crate::replica::{Applied, HostEffect, ReplicaTurtle};
use crate::turtle::Turtle;

/// Receives values from the sending turtle and keeps a replica in sync.
///
/// Replies are only recorded while debug mode is on. Every processed value
/// bumps [`LiveView::revision`] so hosts know when to re-render.
#[derive(Debug, Default)]
pub struct LiveView {
    replica: ReplicaTurtle,
    debug_mode: bool,
    replies: Vec<String>,
    revision: u64,
}

impl LiveView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turtle(&self) -> &Turtle {
        self.replica.turtle()
    }

    pub fn replica(&self) -> &ReplicaTurtle {
        &self.replica
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, on: bool) {
        self.debug_mode = on;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replies recorded so far.
    pub fn replies(&self) -> &[String] {
        &self.replies
    }

    /// Drain recorded replies.
    pub fn take_replies(&mut self) -> Vec<String> {
        std::mem::take(&mut self.replies)
    }

    pub fn connection_opened(&mut self) {
        log::info!("live view connection opened");
    }

    pub fn connection_closed(&mut self) {
        log::info!("live view connection closed");
    }

    /// Record a message for the sender. Dropped unless debug mode is on.
    pub fn reply(&mut self, message: impl Into<String>) {
        if self.debug_mode {
            self.replies.push(message.into());
        }
    }

    /// Process one received value. Never fails: problems become replies.
    pub fn receive(&mut self, value: &WireValue) -> Option<HostEffect> {
        self.revision += 1;

        match value {
            WireValue::Dictionary(_) => self.dispatch(value),
            other => {
                let echo = echo_non_command(other);
                self.reply(echo);
                None
            }
        }
    }

    fn dispatch(&mut self, value: &WireValue) -> Option<HostEffect> {
        match self.replica.apply_value(value) {
            Ok(applied) => self.after_apply(value, applied),
            Err(err) => {
                log::warn!("rejected live view message: {err}");
                self.reply(err.to_string());
                None
            }
        }
    }

    fn after_apply(&mut self, value: &WireValue, applied: Applied) -> Option<HostEffect> {
        match applied.effect {
            Some(HostEffect::NewDrawingStarted) => {
                self.debug_mode = false;
                self.replies.clear();
            }
            Some(HostEffect::DebugModeToggled) => {
                self.reply(format!(
                    "'toggleDebugMode' command received. Debug mode is now: {}",
                    !self.debug_mode
                ));
                self.debug_mode = !self.debug_mode;
            }
            Some(HostEffect::ExportRequested) | None => {
                if self.debug_mode {
                    let message = acknowledgement(value, applied.command);
                    self.reply(message);
                }
            }
        }
        applied.effect
    }
}

/// Friendly echo for a value that is not a command dictionary.
fn echo_non_command(value: &WireValue) -> String {
    match value {
        WireValue::String(text) => format!("You sent this text: {text}"),
        WireValue::Integer(n) => format!("You sent me the number {n}!"),
        WireValue::FloatingPoint(n) => format!("You sent me the number {n}!"),
        WireValue::Boolean(flag) => format!("You sent me the value {flag}!"),
        WireValue::Date(date) => format!("You sent me the date {date}"),
        WireValue::Data(_) => "Hmm. I don't know what to do with data values.".to_string(),
        WireValue::Array(_) => "Hmm. I don't know what to do with an array.".to_string(),
        WireValue::Dictionary(_) => ProtocolError::MissingCommand.to_string(),
    }
}

fn acknowledgement(value: &WireValue, name: &str) -> String {
    match Command::from_value(value) {
        Ok(Command::ReportCurrentPosition { x, y }) => {
            format!("'{name}' command received, position is: ({x}, {y})")
        }
        Ok(Command::ReportCurrentHeading { heading }) => {
            format!("'{name}' command received, heading is: {heading}")
        }
        _ => {
            let params = value
                .as_dictionary()
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|(key, _)| key.as_str() != COMMAND_KEY)
                        .map(|(key, value)| format!("{key}: {}", value.to_json()))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            if params.is_empty() {
                format!("'{name}' command received.")
            } else {
                format!("'{name}' command received with {params}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn send(view: &mut LiveView, command: Command) -> Option<HostEffect> {
        view.receive(&command.to_value().unwrap())
    }

    #[test]
    fn test_replies_only_in_debug_mode() {
        let mut view = LiveView::new();
        view.receive(&WireValue::from("hello"));
        assert!(view.replies().is_empty());

        send(&mut view, Command::ToggleDebugMode);
        assert!(view.is_debug_mode());
        view.receive(&WireValue::from("hello"));
        assert_eq!(view.replies().last().unwrap(), "You sent this text: hello");
    }

    #[test]
    fn test_echoes() {
        let mut view = LiveView::new();
        view.set_debug_mode(true);
        view.receive(&WireValue::Integer(4));
        view.receive(&WireValue::FloatingPoint(2.5));
        view.receive(&WireValue::Boolean(true));
        view.receive(&WireValue::Data(vec![1]));
        view.receive(&WireValue::Array(vec![]));
        view.receive(&WireValue::Dictionary(BTreeMap::new()));
        assert_eq!(
            view.take_replies(),
            vec![
                "You sent me the number 4!",
                "You sent me the number 2.5!",
                "You sent me the value true!",
                "Hmm. I don't know what to do with data values.",
                "Hmm. I don't know what to do with an array.",
                "Hmm. I was sent a dictionary, but it was missing a \"Command\".",
            ]
        );
        assert!(view.replies().is_empty());
    }

    #[test]
    fn test_unknown_command_is_not_fatal() {
        let mut view = LiveView::new();
        view.set_debug_mode(true);
        let value = WireValue::Dictionary(BTreeMap::from([(
            COMMAND_KEY.to_string(),
            WireValue::from("fly"),
        )]));
        assert_eq!(view.receive(&value), None);
        assert_eq!(view.replies(), ["Hmm. I don't recognize the command \"fly\"."]);
        send(&mut view, Command::Forward { distance: 5.0 });
        assert!((view.turtle().position().x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_acknowledgements() {
        let mut view = LiveView::new();
        view.set_debug_mode(true);
        send(&mut view, Command::PenUp);
        send(&mut view, Command::Forward { distance: 5.0 });
        send(&mut view, Command::ReportCurrentPosition { x: 1.0, y: 2.0 });
        assert_eq!(
            view.replies(),
            [
                "'penUp' command received.",
                "'forward' command received with distance: 5.0",
                "'reportCurrentPosition' command received, position is: (1, 2)",
            ]
        );
    }

    #[test]
    fn test_start_new_drawing_resets_debug_state() {
        let mut view = LiveView::new();
        send(&mut view, Command::ToggleDebugMode);
        send(&mut view, Command::Forward { distance: 10.0 });
        assert!(!view.replies().is_empty());

        assert_eq!(
            send(&mut view, Command::StartNewDrawing),
            Some(HostEffect::NewDrawingStarted)
        );
        assert!(!view.is_debug_mode());
        assert!(view.replies().is_empty());
        assert_eq!(view.turtle(), &Turtle::new());
    }

    #[test]
    fn test_export_request_is_passed_to_host() {
        let mut view = LiveView::new();
        assert_eq!(
            send(&mut view, Command::RenderDrawingToPdf),
            Some(HostEffect::ExportRequested)
        );
    }

    #[test]
    fn test_revision_counts_every_value() {
        let mut view = LiveView::new();
        view.receive(&WireValue::from(1.0));
        send(&mut view, Command::PenDown);
        assert_eq!(view.revision(), 2);
    }
}
