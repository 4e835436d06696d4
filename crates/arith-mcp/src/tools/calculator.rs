//! Tool: calculator. Basic arithmetic over a list of numbers.

use serde::Deserialize;
use serde_json::{json, Value};

use arith::{ops::MIN_OPERANDS, Number, Operation};

use crate::types::ToolDescriptor;

use super::tool::{Tool, ToolError};

pub const NAME: &str = "calculator";

#[derive(Debug, Deserialize)]
struct CalculatorParams {
    operation: String,
    numbers: Vec<Value>,
}

/// Adds, subtracts, multiplies or divides an ordered list of numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    fn parse_numbers(values: &[Value]) -> Result<Vec<Number>, ToolError> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Number::from_json(value).ok_or_else(|| {
                    ToolError::InvalidArguments(format!(
                        "Invalid arguments: numbers[{index}] must be a number, got {value}"
                    ))
                })
            })
            .collect()
    }
}

impl Tool for Calculator {
    fn name(&self) -> &str {
        NAME
    }

    fn describe(&self) -> ToolDescriptor {
        let operations: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        ToolDescriptor {
            name: NAME.to_string(),
            description: "A basic calculator that can perform arithmetic operations".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": operations,
                        "description": "The arithmetic operation to perform"
                    },
                    "numbers": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "List of numbers to perform the operation on",
                        "minItems": MIN_OPERANDS
                    }
                },
                "required": ["operation", "numbers"]
            }),
        }
    }

    fn invoke(&self, params: Value) -> Result<Value, ToolError> {
        let params: CalculatorParams = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidArguments(format!("Invalid arguments: {e}")))?;
        let numbers = Self::parse_numbers(&params.numbers)?;

        let result = arith::evaluate(&params.operation, &numbers)?;
        Ok(result.to_json()?)
    }
}
