//! Error types and JSON-RPC error codes for the server.

use super::message::{JsonRpcErrorObject, JsonRpcResponse, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-specific error codes.
pub mod mcp_error_codes {
    /// A method other than `initialize` arrived before the handshake.
    pub const NOT_INITIALIZED: i32 = -32002;
}

/// Protocol and transport level errors.
///
/// Tool failures are not represented here: they are reported per call inside
/// a successful `execute` response (see [`crate::tools::ToolError`]).
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Server not initialized")]
    NotInitialized,

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) | McpError::Json(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::NotInitialized => NOT_INITIALIZED,
            McpError::InternalError(_) | McpError::Transport(_) | McpError::Io(_) => {
                INTERNAL_ERROR
            }
        }
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }

    pub fn to_response(&self, id: Option<RequestId>) -> JsonRpcResponse {
        JsonRpcResponse::failure(id, self.to_error_object())
    }
}

pub type McpResult<T> = Result<T, McpError>;
