//! Configuration resolution: CLI flag, then environment, then default.

use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::protocol::ReinitializePolicy;
use crate::transport::{TransportOptions, DEFAULT_IDLE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

pub const ENV_STDIO_MODE: &str = "MCP_STDIO_MODE";
pub const ENV_HTTP_MODE: &str = "MCP_HTTP_MODE";
pub const ENV_ADDR: &str = "ARITH_MCP_ADDR";
pub const ENV_IDLE_TIMEOUT: &str = "ARITH_MCP_IDLE_TIMEOUT";
pub const ENV_REQUEST_TIMEOUT: &str = "ARITH_MCP_REQUEST_TIMEOUT";
pub const ENV_REINITIALIZE: &str = "ARITH_MCP_REINITIALIZE";

/// Which transports the `serve` command starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Stdio,
    Http,
    /// HTTP + WebSocket with stdio alongside.
    Dual,
}

impl ServerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerMode::Stdio => "stdio",
            ServerMode::Http => "http",
            ServerMode::Dual => "dual",
        }
    }
}

impl std::fmt::Display for ServerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MCP_STDIO_MODE and MCP_HTTP_MODE are both set; pick one")]
    ConflictingModes,
    #[error("{name} must be a whole number of seconds greater than zero, got '{value}'")]
    InvalidDuration { name: &'static str, value: String },
    #[error("ARITH_MCP_REINITIALIZE must be one of reinitialize, reject, ignore, got '{0}'")]
    InvalidReinitialize(String),
}

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: ServerMode,
    pub addr: String,
    pub transport: TransportOptions,
}

/// Values given on the command line; `None` falls through to the environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub addr: Option<String>,
    pub idle_timeout_secs: Option<u64>,
    pub reinitialize: Option<ReinitializePolicy>,
}

impl Config {
    pub fn from_env(overrides: &CliOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable source.
    pub fn resolve<F>(overrides: &CliOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = resolve_mode(&lookup)?;

        let addr = overrides
            .addr
            .clone()
            .or_else(|| non_empty(lookup(ENV_ADDR)))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let idle_timeout = match overrides.idle_timeout_secs {
            Some(0) => {
                return Err(ConfigError::InvalidDuration {
                    name: "--idle-timeout",
                    value: "0".to_string(),
                })
            }
            Some(secs) => Duration::from_secs(secs),
            None => duration_var(&lookup, ENV_IDLE_TIMEOUT)?.unwrap_or(DEFAULT_IDLE_TIMEOUT),
        };

        let request_timeout =
            duration_var(&lookup, ENV_REQUEST_TIMEOUT)?.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let reinitialize = match overrides.reinitialize {
            Some(policy) => policy,
            None => non_empty(lookup(ENV_REINITIALIZE))
                .map(|value| {
                    <ReinitializePolicy as ValueEnum>::from_str(&value, true)
                        .map_err(|_| ConfigError::InvalidReinitialize(value))
                })
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            mode,
            addr,
            transport: TransportOptions {
                reinitialize,
                idle_timeout,
                request_timeout,
            },
        })
    }
}

/// Mode selected by `MCP_STDIO_MODE` / `MCP_HTTP_MODE`.
pub fn resolve_mode<F>(lookup: F) -> Result<ServerMode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let stdio = flag_set(lookup(ENV_STDIO_MODE));
    let http = flag_set(lookup(ENV_HTTP_MODE));

    match (stdio, http) {
        (true, true) => Err(ConfigError::ConflictingModes),
        (true, false) => Ok(ServerMode::Stdio),
        (false, true) => Ok(ServerMode::Http),
        (false, false) => Ok(ServerMode::Dual),
    }
}

pub fn mode_from_env() -> Result<ServerMode, ConfigError> {
    resolve_mode(|key| std::env::var(key).ok())
}

/// Mode for `serve-auto`: exclusive stdio when stdin is an interactive
/// terminal or already has input waiting, HTTP otherwise.
///
/// `input_ready` is only consulted for a non-terminal stdin.
pub async fn auto_mode<F, Fut>(is_terminal: bool, input_ready: F) -> ServerMode
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    if is_terminal || input_ready().await {
        ServerMode::Stdio
    } else {
        ServerMode::Http
    }
}

fn flag_set(value: Option<String>) -> bool {
    value.is_some_and(|v| v.trim() == "1")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn duration_var<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup(name))
        .map(|value| match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidDuration { name, value }),
        })
        .transpose()
}
