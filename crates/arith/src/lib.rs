//! arith — core arithmetic library: numeric model, operations, and evaluation.

pub mod ops;
pub mod types;

pub use ops::{divide, evaluate, multiply, subtract, sum};
pub use types::*;
