//! Tool registration and lookup.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::types::ToolDescriptor;

use super::calculator::Calculator;
use super::tool::Tool;

/// In-memory map from tool name to tool. Populated at startup, then shared
/// read-only behind an `Arc`.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool.
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Calculator);
        registry
    }

    /// Add a tool under its name. A tool with the same name is replaced.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!("Replaced existing tool registration: {name}");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Descriptors keyed by tool name.
    pub fn describe_all(&self) -> BTreeMap<String, ToolDescriptor> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.describe()))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
