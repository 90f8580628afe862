//! Runtime tool entities: the callable registered in a [`crate::server::registry::ToolRegistry`].

use crate::error::Result;
use crate::server::registry::ToolRegistry;
use crate::wire::ToolArgument;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The name the executor recognizes as an injectable dependency. Closed set;
/// extend it (and document the extension) to add new injectables.
pub const INJECTABLE_TOOL_REGISTRY: &str = "tool_registry";

pub type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A native tool's handler: always cooperative, always awaited directly.
///
/// Receives the raw (already injection-resolved) argument map and, when the
/// tool opted into registry injection, the live registry snapshot.
pub type NativeHandler =
    Arc<dyn Fn(Map<String, Value>, Option<Arc<ToolRegistry>>) -> BoxedFuture<Result<Value>> + Send + Sync>;

/// How a tool is dispatched. This is a structural distinction, not a naming
/// heuristic: native tools are Rust async closures compiled into this binary;
/// dynamic tools are loaded at runtime from a compiled plugin library and can
/// only expose a synchronous C-ABI entry point, so they always run on the
/// blocking worker pool.
#[derive(Clone)]
pub enum ToolHandler {
    Native(NativeHandler),
    Dynamic(Arc<crate::server::loader::DynamicToolHandle>),
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolHandler::Native(_) => write!(f, "ToolHandler::Native(..)"),
            ToolHandler::Dynamic(h) => write!(f, "ToolHandler::Dynamic({})", h.library_path.display()),
        }
    }
}

/// A named callable registered with the server.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// Declared parameters, excluding any injectable names (e.g. `tool_registry`).
    pub args: Vec<ToolArgument>,
    /// Whether this tool declared a `tool_registry` parameter and wants the
    /// live registry injected at call time.
    pub wants_registry: bool,
    pub handler: ToolHandler,
}

impl Tool {
    pub fn definition(&self) -> crate::wire::ToolDefinition {
        crate::wire::ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            args: self.args.clone(),
        }
    }
}
