//! Request dispatcher shared by every transport.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::tools::ToolRegistry;
use crate::types::*;

use super::method::Method;
use super::policy::{ReinitializePolicy, SessionPolicy};
use super::session::SessionState;
use super::validator;

/// What the transport should do after sending the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// A `shutdown` was handled. Whether the process exits is up to the
    /// transport.
    Shutdown,
}

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub response: JsonRpcResponse,
    pub control: Control,
}

impl Dispatch {
    fn parse_error(err: McpError) -> Self {
        tracing::warn!("Parse error: {err}");
        Self {
            response: err.to_response(None),
            control: Control::Continue,
        }
    }
}

/// Routes JSON-RPC requests against a session. Holds no session state of
/// its own, so one instance serves every transport and connection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Parse and dispatch one raw message.
    pub fn handle_text(
        &self,
        state: &mut SessionState,
        text: &str,
        policy: &SessionPolicy,
    ) -> Dispatch {
        match validator::parse_text(text) {
            Ok(request) => self.dispatch(state, request, policy),
            Err(e) => Dispatch::parse_error(e),
        }
    }

    /// Validate and dispatch an already decoded message.
    pub fn handle_value(
        &self,
        state: &mut SessionState,
        value: Value,
        policy: &SessionPolicy,
    ) -> Dispatch {
        match validator::parse_value(value) {
            Ok(request) => self.dispatch(state, request, policy),
            Err(e) => Dispatch::parse_error(e),
        }
    }

    pub fn dispatch(
        &self,
        state: &mut SessionState,
        request: JsonRpcRequest,
        policy: &SessionPolicy,
    ) -> Dispatch {
        let method = Method::from(request.method.as_str());
        let id = request.id;

        if policy.should_auto_initialize(state, &method) && !state.is_initialized() {
            state.auto_initialize();
        }

        let (response, control) = match self.route(state, &method, request.params, policy) {
            Ok((result, control)) => (JsonRpcResponse::success(id.clone(), result), control),
            Err(e) => (e.to_response(id.clone()), Control::Continue),
        };

        tracing::debug!(
            method = %method,
            id = ?id,
            outcome = if response.is_error() { "failure" } else { "success" },
            "request dispatched"
        );

        Dispatch { response, control }
    }

    fn route(
        &self,
        state: &mut SessionState,
        method: &Method,
        params: Option<Map<String, Value>>,
        policy: &SessionPolicy,
    ) -> McpResult<(Value, Control)> {
        let result = match method {
            Method::Initialize if policy.handshake_bypass || !state.is_initialized() => {
                self.handle_initialize(state, params)?
            }
            Method::Initialize => match policy.reinitialize {
                ReinitializePolicy::Reinitialize => self.handle_initialize(state, params)?,
                ReinitializePolicy::Reject => {
                    return Err(McpError::InvalidRequest(
                        "Server already initialized".to_string(),
                    ))
                }
                ReinitializePolicy::Ignore => {
                    return Err(McpError::MethodNotFound(method.to_string()))
                }
            },
            Method::ListTools if policy.handshake_bypass => self.handle_list_tools()?,
            _ if !state.is_initialized() => return Err(McpError::NotInitialized),
            Method::Shutdown => {
                state.shutdown();
                return Ok((Value::Null, Control::Shutdown));
            }
            Method::ListTools => self.handle_list_tools()?,
            Method::Execute => self.handle_execute(params)?,
            Method::Unknown(name) => return Err(McpError::MethodNotFound(name.clone())),
        };

        Ok((result, Control::Continue))
    }

    fn handle_initialize(
        &self,
        state: &mut SessionState,
        params: Option<Map<String, Value>>,
    ) -> McpResult<Value> {
        state.handshake(params);
        let result = InitializeResult::new(self.registry.describe_all());
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_list_tools(&self) -> McpResult<Value> {
        serde_json::to_value(self.registry.describe_all())
            .map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_execute(&self, params: Option<Map<String, Value>>) -> McpResult<Value> {
        let params: ExecuteParams = params
            .map(|p| serde_json::from_value(Value::Object(p)))
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Execute params required".to_string()))?;

        if params.function_calls.is_empty() {
            return Err(McpError::InvalidParams(
                "function_calls must not be empty".to_string(),
            ));
        }

        let results = self.execute_calls(&params.function_calls);
        serde_json::to_value(results).map_err(|e| McpError::InternalError(e.to_string()))
    }

    /// Run each call in order. One entry per call; a failing call never
    /// affects its siblings.
    pub fn execute_calls(&self, calls: &[FunctionCall]) -> Vec<ToolCallResult> {
        calls.iter().map(|call| self.execute_call(call)).collect()
    }

    fn execute_call(&self, call: &FunctionCall) -> ToolCallResult {
        let Some(tool) = self.registry.lookup(&call.name) else {
            return ToolCallResult::error(format!("Tool '{}' not found", call.name));
        };

        let params = Value::Object(call.parameters.clone());
        match catch_unwind(AssertUnwindSafe(|| tool.invoke(params))) {
            Ok(Ok(result)) => ToolCallResult::success(result),
            Ok(Err(e)) => {
                tracing::debug!("Tool '{}' failed: {e}", call.name);
                ToolCallResult::error(e.to_string())
            }
            Err(_) => {
                tracing::error!("Tool '{}' panicked", call.name);
                ToolCallResult::error(format!("Tool '{}' failed unexpectedly", call.name))
            }
        }
    }
}
