//! Tool descriptor and per-call result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Public description of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON-Schema-like `{type, properties, required}` object.
    pub parameters: Value,
}

/// Outcome of one call inside an `execute` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolCallResult {
    Success { result: Value },
    Error { error: String },
}

impl ToolCallResult {
    pub fn success(result: Value) -> Self {
        Self::Success { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
