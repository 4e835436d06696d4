//! The `Tool` trait every registered capability implements.

use serde_json::Value;

use crate::types::ToolDescriptor;

/// A named, schema-described unit of invocable functionality.
pub trait Tool: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;

    fn describe(&self) -> ToolDescriptor;

    /// Run the tool. Failures become a per-call `{status: "error"}` entry and
    /// never abort sibling calls.
    fn invoke(&self, params: Value) -> Result<Value, ToolError>;
}

/// Failure of a single tool invocation. Displays as the bare message, which
/// is what clients see in the `error` field.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Execution(String),
}

impl From<arith::CalcError> for ToolError {
    fn from(e: arith::CalcError) -> Self {
        match e {
            arith::CalcError::NotEnoughNumbers => ToolError::InvalidArguments(e.to_string()),
            _ => ToolError::Execution(e.to_string()),
        }
    }
}
