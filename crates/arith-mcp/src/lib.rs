//! arith-mcp — a calculator exposed over JSON-RPC on stdio, HTTP, and WebSocket.

pub mod config;
pub mod logging;
pub mod protocol;
pub mod repl;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{Config, ServerMode};
pub use protocol::{Dispatcher, SessionPolicy, SessionState};
pub use tools::ToolRegistry;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::StdioTransport;
