//! Envelope parsing and validation.
//!
//! Anything that does not yield a well-formed request is a parse error.

use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Parse raw text into a validated request.
pub fn parse_text(text: &str) -> McpResult<JsonRpcRequest> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| McpError::ParseError(e.to_string()))?;
    parse_value(value)
}

/// Interpret an already decoded JSON value as a validated request.
pub fn parse_value(value: Value) -> McpResult<JsonRpcRequest> {
    if !value.is_object() {
        return Err(McpError::ParseError(
            "Request must be a JSON object".to_string(),
        ));
    }

    let request: JsonRpcRequest =
        serde_json::from_value(value).map_err(|e| McpError::ParseError(e.to_string()))?;
    validate_request(&request)?;
    Ok(request)
}

/// Check the fields serde cannot check by itself.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::ParseError(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{}\"",
            request.jsonrpc
        )));
    }

    if request.method.trim().is_empty() {
        return Err(McpError::ParseError(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}
