//! Tool trait, registry, and built-in tools.

pub mod calculator;
pub mod registry;
pub mod tool;

pub use calculator::Calculator;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolError};
