//! Looks up the requested tool in the currently captured registry snapshot,
//! injects the closed set of known dependencies, dispatches, and wraps the
//! outcome into a response message.

use crate::error::Error;
use crate::server::registry::ToolRegistry;
use crate::tool::{ToolHandler, INJECTABLE_TOOL_REGISTRY};
use crate::wire::{ErrorCode, Header, ServerMessage, ToolCallBody};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Holds the current registry pointer and dispatches `tool_call` requests
/// against whichever snapshot a given call captured at dispatch time.
///
/// The pointer is published by simple assignment (`update_registry`); readers
/// clone the `Arc` once per call into a local, so a later swap never changes
/// what an in-flight call resolves to.
pub struct ToolExecutor {
    registry: RwLock<Arc<ToolRegistry>>,
}

impl ToolExecutor {
    pub fn new(initial: Arc<ToolRegistry>) -> Self {
        Self {
            registry: RwLock::new(initial),
        }
    }

    /// Atomically replaces the registry pointer. In-flight calls that already
    /// captured the previous snapshot are unaffected.
    pub fn update_registry(&self, new_registry: Arc<ToolRegistry>) {
        *self.registry.write().expect("registry lock poisoned") = new_registry;
    }

    pub fn current_registry(&self) -> Arc<ToolRegistry> {
        self.registry.read().expect("registry lock poisoned").clone()
    }

    pub async fn execute(&self, header: Header, body: ToolCallBody) -> ServerMessage {
        let registry = self.current_registry();

        let tool = match registry.get(&body.tool).cloned() {
            Some(tool) => tool,
            None => {
                return ServerMessage::error(
                    header,
                    ErrorCode::ToolNotFound,
                    format!("no tool named '{}' is registered", body.tool),
                )
            }
        };

        if body.args.contains_key(INJECTABLE_TOOL_REGISTRY) {
            return ServerMessage::error(
                header,
                ErrorCode::ExecutionError,
                format!("'{}' is a reserved argument name", INJECTABLE_TOOL_REGISTRY),
            );
        }

        let result = match &tool.handler {
            ToolHandler::Native(handler) => {
                let injected = if tool.wants_registry {
                    Some(registry.clone())
                } else {
                    None
                };
                handler(body.args.clone(), injected).await
            }
            ToolHandler::Dynamic(handle) => {
                let handle = handle.clone();
                let args_value = Value::Object(body.args.clone());
                let registry_defs = if tool.wants_registry {
                    serde_json::to_value(registry.definitions()).unwrap_or(Value::Null)
                } else {
                    Value::Null
                };
                // Synchronous plugin tools run on the blocking worker pool so
                // a slow plugin call never blocks the cooperative scheduler.
                tokio::task::spawn_blocking(move || handle.invoke_blocking(&args_value, &registry_defs))
                    .await
                    .unwrap_or_else(|join_err| Err(Error::Other(format!("tool task panicked: {}", join_err))))
            }
        };

        match result {
            Ok(value) => ServerMessage::success(header, body.tool, value),
            Err(e) => {
                tracing::error!(tool = %body.tool, error = %e, "tool execution failed");
                ServerMessage::error(header, ErrorCode::ExecutionError, "tool execution failed")
            }
        }
    }
}
