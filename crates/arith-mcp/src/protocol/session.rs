//! Per-session handshake state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// State of one logical session: a WebSocket connection, the stdio stream,
/// or the HTTP endpoint as a whole (see [`SharedSession`]).
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub initialized: bool,
    pub client_info: Option<Map<String, Value>>,
    /// When the session was last marked initialized, explicitly or not.
    pub initialized_at: Option<DateTime<Utc>>,
}

/// The one session shared by every HTTP request. HTTP has no connection to
/// hang a session on, so requests are serialized through this lock for the
/// whole dispatch.
pub type SharedSession = Arc<Mutex<SessionState>>;

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts out initialized, with no client info.
    pub fn preinitialized() -> Self {
        let mut state = Self::new();
        state.auto_initialize();
        state
    }

    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Explicit handshake: records the client's params as its info.
    pub fn handshake(&mut self, client_info: Option<Map<String, Value>>) {
        match client_info.as_ref().and_then(|info| info.get("client_name")) {
            Some(name) => tracing::info!("Initialized with client: {name}"),
            None => tracing::info!("Initialized"),
        }
        self.client_info = client_info;
        self.initialized = true;
        self.initialized_at = Some(Utc::now());
    }

    /// Mark initialized without a handshake. Client info is left untouched.
    pub fn auto_initialize(&mut self) {
        tracing::debug!("Session auto-initialized");
        self.initialized = true;
        self.initialized_at = Some(Utc::now());
    }

    /// Back to uninitialized. Client info is kept until the next handshake.
    pub fn shutdown(&mut self) {
        tracing::info!("Session shut down");
        self.initialized = false;
    }
}
