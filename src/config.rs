//! Process configuration from environment variables

use crate::state_machine::state::{DEFAULT_MAX_INPUT_CHARS, DEFAULT_REPLY_DELAY};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub port: u16,
    /// Delay before the simulated reply lands
    pub reply_delay: Duration,
    /// Input capture limit in characters
    pub max_input_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            reply_delay: DEFAULT_REPLY_DELAY,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(&lookup, "FINCHAT_PORT", "a port number")?.unwrap_or(defaults.port);

        let reply_delay = parse_var::<u64>(&lookup, "FINCHAT_REPLY_DELAY_MS", "milliseconds")?
            .map_or(defaults.reply_delay, Duration::from_millis);

        let max_input_chars =
            parse_var::<usize>(&lookup, "FINCHAT_MAX_INPUT_CHARS", "a positive integer")?
                .unwrap_or(defaults.max_input_chars);
        if max_input_chars == 0 {
            return Err(ConfigError::Invalid {
                name: "FINCHAT_MAX_INPUT_CHARS",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port,
            reply_delay,
            max_input_chars,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                name,
                expected,
                value,
            }),
    }
}
