//! Configuration parsed from environment variables.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::protocol::ArcEncoding;

pub const ARC_ENCODING_VAR: &str = "TORTOISE_ARC_ENCODING";
pub const REPORT_QUERIES_VAR: &str = "TORTOISE_REPORT_QUERIES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings of the sending turtle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurtleConfig {
    pub arc_encoding: ArcEncoding,
    /// Send `reportCurrentPosition` / `reportCurrentHeading` when queried.
    pub report_queries: bool,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            arc_encoding: ArcEncoding::Compound,
            report_queries: true,
        }
    }
}

impl TurtleConfig {
    /// Optional:
    /// - `TORTOISE_ARC_ENCODING`: `compound` (default) or `legacy`
    /// - `TORTOISE_REPORT_QUERIES`: `true` (default) or `false`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TurtleConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            arc_encoding: parse_var(
                ARC_ENCODING_VAR,
                lookup(ARC_ENCODING_VAR),
                defaults.arc_encoding,
            )?,
            report_queries: parse_var(
                REPORT_QUERIES_VAR,
                lookup(REPORT_QUERIES_VAR),
                defaults.report_queries,
            )?,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset or blank.
pub fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<T>().map_err(|err| ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: err.to_string(),
        }),
    }
}
