//! Handshake result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::response::ToolDescriptor;

pub const SERVER_NAME: &str = "arith-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: BTreeMap<String, ToolDescriptor>,
}

/// Result of a successful `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    pub name: String,
    pub version: String,
    pub capabilities: ServerCapabilities,
}

impl InitializeResult {
    pub fn new(tools: BTreeMap<String, ToolDescriptor>) -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
            capabilities: ServerCapabilities { tools },
        }
    }
}
