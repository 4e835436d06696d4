//! Transport layer: stdio, HTTP, and WebSocket adapters over one dispatcher.

use std::time::Duration;

use crate::protocol::{ReinitializePolicy, SessionPolicy};

pub mod framing;
#[cfg(feature = "http")]
pub mod http;
pub mod stdio;
#[cfg(feature = "http")]
pub mod ws;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use stdio::{input_ready, StdioExit, StdioMode, StdioTransport};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub reinitialize: ReinitializePolicy,
    /// WebSocket connections silent for this long are closed.
    pub idle_timeout: Duration,
    /// Upper bound on one HTTP request.
    pub request_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            reinitialize: ReinitializePolicy::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransportOptions {
    /// Apply the configured settings to a transport's base policy.
    pub fn policy(&self, base: SessionPolicy) -> SessionPolicy {
        base.with_reinitialize(self.reinitialize)
    }
}
