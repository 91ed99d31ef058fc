//! Tortoise Core Library
//!
//! Turtle state machine, drawing history and the command relay between a
//! sending turtle and its live view.

pub mod authoritative;
pub mod channel;
pub mod color;
pub mod config;
pub mod drawing;
pub mod liveview;
pub mod path;
pub mod protocol;
pub mod replica;
pub mod turtle;

pub use authoritative::AuthoritativeTurtle;
pub use channel::{ChannelError, CommandSink, LocalLink, Outbox};
#[cfg(not(target_arch = "wasm32"))]
pub use channel::WebSocketSink;
pub use color::Rgba;
pub use config::{ConfigError, TurtleConfig};
pub use drawing::{Drawing, Text};
pub use liveview::LiveView;
pub use path::TurtlePath;
pub use protocol::{ArcEncoding, Command, ProtocolError, WireValue};
pub use replica::{Applied, HeadingCompensation, HostEffect, ReplicaTurtle};
pub use turtle::{Anchor, Axes, CircularArc, Curve, Turtle, TurtleOps};
