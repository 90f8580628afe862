use crate::tool::{NativeHandler, Tool, ToolHandler};
use serde_json::json;
use std::sync::Arc;

pub fn ping_tool() -> Tool {
    let handler: NativeHandler = Arc::new(|_args, _registry| Box::pin(async { Ok(json!("pong")) }));

    Tool {
        name: "ping".to_string(),
        description: "Replies 'pong'. Useful for liveness checks.".to_string(),
        args: vec![],
        wants_registry: false,
        handler: ToolHandler::Native(handler),
    }
}
