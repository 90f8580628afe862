//! The immutable tool registry: a name→tool snapshot, published atomically by
//! the loader on every (re)load.

use crate::error::{Error, Result};
use crate::tool::Tool;
use crate::wire::ToolDefinition;
use std::collections::HashMap;

/// An immutable snapshot of the registered tools.
///
/// Registries are append-only during construction; once built, a `ToolRegistry`
/// never mutates. A hot-reload constructs an entirely new registry and
/// publishes it, rather than mutating the old one in place, so that a
/// dispatch which captured a snapshot continues to observe it unchanged.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool, failing if a tool with the same name is already present.
    pub fn register(&mut self, tool: Tool) -> Result<()> {
        if self.tools.contains_key(&tool.name) {
            return Err(Error::Other(format!("duplicate tool name: {}", tool.name)));
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions sorted by name ascending: stable, deterministic, testable.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(Tool::definition).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{NativeHandler, ToolHandler};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn dummy_tool(name: &str) -> Tool {
        let handler: NativeHandler = Arc::new(move |_args, _registry| {
            Box::pin(async move { Ok::<Value, Error>(json!(null)) })
        });
        Tool {
            name: name.to_string(),
            description: String::new(),
            args: vec![],
            wants_registry: false,
            handler: ToolHandler::Native(handler),
        }
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(dummy_tool("ping")).unwrap();
        let err = registry.register(dummy_tool("ping")).unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn definitions_are_sorted_regardless_of_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(dummy_tool("zeta")).unwrap();
        registry.register(dummy_tool("alpha")).unwrap();
        registry.register(dummy_tool("mid")).unwrap();
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn get_returns_none_for_unknown_name() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
