//! Evaluation of calculator operations over an ordered list of numbers.

use crate::types::{CalcError, CalcResult, Number, Operation};

/// Minimum number of operands every operation requires.
pub const MIN_OPERANDS: usize = 2;

/// Evaluate `operation` over `numbers`, left to right.
///
/// The operand count is checked before the operation name, so an unknown
/// operation with a single operand reports the operand error.
pub fn evaluate(operation: &str, numbers: &[Number]) -> CalcResult<Number> {
    if numbers.len() < MIN_OPERANDS {
        return Err(CalcError::NotEnoughNumbers);
    }

    let op: Operation = operation.parse()?;
    let result = match op {
        Operation::Add => sum(numbers),
        Operation::Subtract => subtract(numbers),
        Operation::Multiply => multiply(numbers),
        Operation::Divide => divide(numbers)?,
    };

    tracing::trace!(%op, operands = numbers.len(), %result, "evaluated");

    if !result.is_finite() {
        return Err(CalcError::NonFinite);
    }
    Ok(result)
}

/// Sum of all elements.
pub fn sum(numbers: &[Number]) -> Number {
    numbers.iter().fold(Number::Int(0), |acc, n| acc + *n)
}

/// `numbers[0] - sum(numbers[1..])`.
pub fn subtract(numbers: &[Number]) -> Number {
    match numbers.split_first() {
        Some((first, rest)) => *first - sum(rest),
        None => Number::Int(0),
    }
}

/// Product of all elements.
pub fn multiply(numbers: &[Number]) -> Number {
    numbers.iter().fold(Number::Int(1), |acc, n| acc * *n)
}

/// `numbers[0]` divided by each following element in turn.
///
/// Every divisor is checked for zero before any division happens.
pub fn divide(numbers: &[Number]) -> CalcResult<Number> {
    let Some((first, divisors)) = numbers.split_first() else {
        return Err(CalcError::NotEnoughNumbers);
    };

    if divisors.iter().any(|d| d.is_zero()) {
        return Err(CalcError::DivisionByZero);
    }

    let quotient = divisors
        .iter()
        .fold(first.as_f64(), |acc, d| acc / d.as_f64());
    Ok(Number::Float(quotient))
}
