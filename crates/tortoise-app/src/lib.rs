//! Tortoise Application
//!
//! Runs a turtle program on a sending turtle wired to a live view, then
//! renders the result.

mod app;
mod program;

pub use app::{App, AppConfig, AppError, RunReport};
pub use program::page_program;
