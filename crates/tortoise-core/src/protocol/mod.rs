//! Command relay protocol between the sending turtle and the live view.

pub mod command;
pub mod value;

pub use command::{ArcEncoding, COMMAND_KEY, Command, ProtocolError};
pub use value::WireValue;
