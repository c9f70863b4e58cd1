//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use geo::{AverageSpeed, Distance};

use crate::error::{OrchestrationError, Result};

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

/// Orchestration settings with sensible defaults.
///
/// Reads from environment variables:
/// - `DISPATCH_MAX_RADIUS_KM`: maximum assignment radius (default: `50`)
/// - `DISPATCH_AVERAGE_SPEED_KMH`: speed used for route duration and ETA (default: `30`)
/// - `DISPATCH_MAX_ASSIGNMENT_ATTEMPTS`: candidates tried per dispatch (default: `3`)
/// - `COMMAND_MAX_RETRIES`: retries after a concurrency conflict (default: `3`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
#[derive(Debug, Clone)]
pub struct Config {
    pub max_radius: Distance,
    pub average_speed: AverageSpeed,
    pub max_assignment_attempts: usize,
    pub command_max_retries: u32,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let radius_km = parse_or_default("DISPATCH_MAX_RADIUS_KM", defaults.max_radius.as_km())?;
        let speed_kmh =
            parse_or_default("DISPATCH_AVERAGE_SPEED_KMH", defaults.average_speed.kmh())?;
        let max_assignment_attempts = parse_or_default(
            "DISPATCH_MAX_ASSIGNMENT_ATTEMPTS",
            defaults.max_assignment_attempts,
        )?;
        if max_assignment_attempts == 0 {
            return Err(OrchestrationError::Config(
                "invalid DISPATCH_MAX_ASSIGNMENT_ATTEMPTS: must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_radius: Distance::from_km(radius_km).map_err(|err| {
                OrchestrationError::Config(format!("invalid DISPATCH_MAX_RADIUS_KM: {err}"))
            })?,
            average_speed: AverageSpeed::from_kmh(speed_kmh).map_err(|err| {
                OrchestrationError::Config(format!("invalid DISPATCH_AVERAGE_SPEED_KMH: {err}"))
            })?,
            max_assignment_attempts,
            command_max_retries: parse_or_default("COMMAND_MAX_RETRIES", defaults.command_max_retries)?,
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_or_default("LOG_FORMAT", defaults.log_format)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_radius: Distance::from_km(domain::dispatch::MAX_ASSIGNMENT_RADIUS_KM)
                .unwrap_or(Distance::ZERO),
            average_speed: AverageSpeed::default(),
            max_assignment_attempts: 3,
            command_max_retries: 3,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| OrchestrationError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
