//! Request parameter types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of an `execute` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub parameters: Map<String, Value>,
}

/// Params of the `execute` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteParams {
    pub function_calls: Vec<FunctionCall>,
}
