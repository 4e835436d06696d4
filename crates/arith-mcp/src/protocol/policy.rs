//! Per-transport session policy passed into the dispatcher.

use super::method::Method;
use super::session::SessionState;

/// When a session is marked initialized without an explicit handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoInitialize {
    /// Strict handshake (stdio).
    Never,
    /// On the first non-`initialize` call of an uninitialized session
    /// (HTTP `POST /`, WebSocket `/`).
    OnFirstCall,
    /// Before every call (`/mcp` endpoints).
    Always,
}

/// What `initialize` does on a session that is already initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReinitializePolicy {
    /// Run the handshake again, replacing the recorded client info.
    #[default]
    Reinitialize,
    /// Answer with an `InvalidRequest` "already initialized" error.
    Reject,
    /// Legacy behavior: the call falls through the method table and is
    /// answered with `MethodNotFound`.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub auto_initialize: AutoInitialize,
    /// Answer `initialize` and `list_tools` directly, whatever the session
    /// state.
    pub handshake_bypass: bool,
    pub reinitialize: ReinitializePolicy,
}

impl SessionPolicy {
    /// Mandatory handshake.
    pub fn strict() -> Self {
        Self {
            auto_initialize: AutoInitialize::Never,
            handshake_bypass: false,
            reinitialize: ReinitializePolicy::default(),
        }
    }

    /// Self-initializes on the first non-handshake call.
    pub fn auto() -> Self {
        Self {
            auto_initialize: AutoInitialize::OnFirstCall,
            ..Self::strict()
        }
    }

    /// Compatibility mode for stricter external integrations.
    pub fn compat() -> Self {
        Self {
            auto_initialize: AutoInitialize::Always,
            handshake_bypass: true,
            ..Self::strict()
        }
    }

    pub fn with_reinitialize(mut self, reinitialize: ReinitializePolicy) -> Self {
        self.reinitialize = reinitialize;
        self
    }

    pub(crate) fn should_auto_initialize(&self, state: &SessionState, method: &Method) -> bool {
        match self.auto_initialize {
            AutoInitialize::Never => false,
            AutoInitialize::OnFirstCall => {
                !state.is_initialized() && *method != Method::Initialize
            }
            AutoInitialize::Always => true,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::strict()
    }
}
