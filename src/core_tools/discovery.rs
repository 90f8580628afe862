use crate::error::{Error, Result};
use crate::tool::{NativeHandler, Tool, ToolHandler};
use std::sync::Arc;

/// Returns the live registry's tool definitions, sorted by name. Declares the
/// `tool_registry` injectable, so the executor supplies the current snapshot
/// and the public definition exposes no arguments at all.
pub fn list_tools_available_tool() -> Tool {
    let handler: NativeHandler = Arc::new(|_args, registry| {
        Box::pin(async move {
            let registry = registry.ok_or_else(|| {
                Error::Other("list_tools_available requires registry injection".into())
            })?;
            let defs = registry.definitions();
            serde_json::to_value(defs).map_err(Error::from)
        })
    });

    Tool {
        name: "list_tools_available".to_string(),
        description: "Lists the tools currently registered on the server.".to_string(),
        args: vec![],
        wants_registry: true,
        handler: ToolHandler::Native(handler),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_tools::system;
    use crate::server::registry::ToolRegistry;
    use crate::tool::ToolHandler;

    #[tokio::test]
    async fn lists_tools_sorted_by_name_when_registry_is_injected() {
        let tool = list_tools_available_tool();
        let mut registry = ToolRegistry::new();
        registry.register(system::ping_tool()).unwrap();
        registry.register(tool.clone()).unwrap();

        let ToolHandler::Native(handler) = &tool.handler else {
            panic!("expected a native tool");
        };
        let result = handler(Default::default(), Some(Arc::new(registry)))
            .await
            .unwrap();
        let names: Vec<String> = result
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["list_tools_available", "ping"]);
    }

    #[tokio::test]
    async fn without_injection_it_fails_rather_than_silently_returning_empty() {
        let tool = list_tools_available_tool();
        let ToolHandler::Native(handler) = &tool.handler else {
            panic!("expected a native tool");
        };
        assert!(handler(Default::default(), None).await.is_err());
    }
}
