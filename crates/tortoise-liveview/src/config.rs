//! Server configuration parsed from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use kurbo::Size;
use tortoise_core::config::{ConfigError, parse_var};

pub const ADDR_VAR: &str = "TORTOISE_LIVEVIEW_ADDR";
pub const CANVAS_WIDTH_VAR: &str = "TORTOISE_CANVAS_WIDTH";
pub const CANVAS_HEIGHT_VAR: &str = "TORTOISE_CANVAS_HEIGHT";
pub const EXPORT_PATH_VAR: &str = "TORTOISE_EXPORT_PATH";

pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub canvas: Size,
    /// Where `renderDrawingToPDF` requests write the drawing, if anywhere.
    pub export_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Optional:
    /// - `TORTOISE_LIVEVIEW_ADDR`: default `0.0.0.0:3030`
    /// - `TORTOISE_CANVAS_WIDTH` / `TORTOISE_CANVAS_HEIGHT`: default 800 x 600
    /// - `TORTOISE_EXPORT_PATH`: export target, unset disables file export
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_addr = SocketAddr::from(([0, 0, 0, 0], 3030));
        let addr = parse_var(ADDR_VAR, lookup(ADDR_VAR), default_addr)?;
        let width = canvas_side(
            CANVAS_WIDTH_VAR,
            lookup(CANVAS_WIDTH_VAR),
            DEFAULT_CANVAS_WIDTH,
        )?;
        let height = canvas_side(
            CANVAS_HEIGHT_VAR,
            lookup(CANVAS_HEIGHT_VAR),
            DEFAULT_CANVAS_HEIGHT,
        )?;
        let export_path = lookup(EXPORT_PATH_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            addr,
            canvas: Size::new(width, height),
            export_path,
        })
    }
}

fn canvas_side(key: &str, raw: Option<String>, default: f64) -> Result<f64, ConfigError> {
    let value = parse_var(key, raw, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a positive number".to_string(),
        })
    }
}
