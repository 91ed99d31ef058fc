//! Application wiring: configuration, transport selection and output.

use std::cell::RefCell;
use std::io::Write as _;
use std::path::PathBuf;
use std::rc::Rc;

use kurbo::Size;
use thiserror::Error;
use tortoise_core::config::{ConfigError, parse_var};
use tortoise_core::{
    AuthoritativeTurtle, ChannelError, CommandSink, LiveView, LocalLink, Turtle, TurtleConfig,
    TurtleOps, WebSocketSink,
};
use tortoise_render::RendererError;

use crate::program::page_program;

pub const LIVEVIEW_URL_VAR: &str = "TORTOISE_LIVEVIEW_URL";
pub const OUTPUT_VAR: &str = "TORTOISE_OUTPUT";
pub const CANVAS_WIDTH_VAR: &str = "TORTOISE_CANVAS_WIDTH";
pub const CANVAS_HEIGHT_VAR: &str = "TORTOISE_CANVAS_HEIGHT";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("live view error: {0}")]
    Channel(#[from] ChannelError),
    #[error("render error: {0}")]
    Render(#[from] RendererError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Remote live view; `None` runs one in-process.
    pub liveview_url: Option<String>,
    pub turtle: TurtleConfig,
    /// SVG destination; `None` writes to stdout.
    pub output: Option<PathBuf>,
    pub canvas: Size,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            liveview_url: None,
            turtle: TurtleConfig::default(),
            output: None,
            canvas: Size::new(800.0, 600.0),
        }
    }
}

impl AppConfig {
    /// Optional:
    /// - `TORTOISE_LIVEVIEW_URL`: `ws://` or `wss://` URL of a live view
    /// - `TORTOISE_ARC_ENCODING`, `TORTOISE_REPORT_QUERIES`: see [`TurtleConfig`]
    /// - `TORTOISE_OUTPUT`: SVG output path, stdout when unset
    /// - `TORTOISE_CANVAS_WIDTH` / `TORTOISE_CANVAS_HEIGHT`: default 800 x 600
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Ok(Self {
            liveview_url: non_blank(LIVEVIEW_URL_VAR),
            turtle: TurtleConfig::from_lookup(&lookup)?,
            output: non_blank(OUTPUT_VAR).map(PathBuf::from),
            canvas: Size::new(
                parse_var(CANVAS_WIDTH_VAR, lookup(CANVAS_WIDTH_VAR), defaults.canvas.width)?,
                parse_var(CANVAS_HEIGHT_VAR, lookup(CANVAS_HEIGHT_VAR), defaults.canvas.height)?,
            ),
        })
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// State the drawing was rendered from.
    pub turtle: Turtle,
    /// Replies the live view sent back.
    pub replies: Vec<String>,
    pub svg: String,
}

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run the page program and write the rendered drawing.
    pub fn run(&self) -> Result<RunReport, AppError> {
        let report = match &self.config.liveview_url {
            Some(url) => self.run_remote(url)?,
            None => self.run_local()?,
        };
        for reply in &report.replies {
            log::info!("live view: {reply}");
        }
        self.write_output(&report.svg)?;
        Ok(report)
    }

    /// Run against an in-process live view and render what it replayed.
    pub fn run_local(&self) -> Result<RunReport, AppError> {
        let view = Rc::new(RefCell::new(LiveView::new()));
        let mut turtle =
            AuthoritativeTurtle::with_config(LocalLink::new(Rc::clone(&view)), self.config.turtle);
        run_page(&mut turtle);

        let mut view = view.borrow_mut();
        view.connection_closed();
        let replica = view.turtle().clone();
        if replica != *turtle.turtle() {
            log::warn!("live view drawing diverged from the program's turtle");
        }
        self.report(replica, view.take_replies())
    }

    /// Run against a remote live view and render the program's own turtle.
    pub fn run_remote(&self, url: &str) -> Result<RunReport, AppError> {
        let sink = WebSocketSink::connect(url)?;
        let mut turtle = AuthoritativeTurtle::with_config(sink, self.config.turtle);
        run_page(&mut turtle);

        let (state, mut sink) = turtle.into_parts();
        sink.close();
        let replies = sink.poll_replies();
        self.report(state, replies)
    }

    fn report(&self, turtle: Turtle, replies: Vec<String>) -> Result<RunReport, AppError> {
        let svg = tortoise_render::render_svg(&turtle, self.config.canvas)?;
        Ok(RunReport {
            turtle,
            replies,
            svg,
        })
    }

    fn write_output(&self, svg: &str) -> Result<(), AppError> {
        match &self.config.output {
            Some(path) => {
                std::fs::write(path, svg)?;
                log::info!("wrote drawing to {}", path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(svg.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Reset both sides, then run the page program.
fn run_page<S: CommandSink>(turtle: &mut AuthoritativeTurtle<S>) {
    turtle.start();
    page_program(turtle);
}
