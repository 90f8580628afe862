//! # mcp-runtime
//!
//! A WebSocket-based tool-call RPC runtime: a server that hosts a hot-reloadable
//! tool registry (native, in-process handlers and dynamically loaded plugin
//! libraries) dispatched over a correlation-id-tagged request/response wire
//! protocol, and a client that multiplexes concurrent calls over a single
//! connection.
//!
//! ## Crate structure
//!
//! * `wire`: the request/response JSON schema carried one-per-frame over the socket.
//! * `tool`: the `Tool`/`ToolHandler` types a registry holds.
//! * `network`: the `NetworkAdapter` transport trait and its WebSocket implementation.
//! * `server`: the registry, hot-reload loader/watcher, connection manager,
//!   validator, router, executor, and the orchestrator tying them together.
//! * `client`: the connect/call/close API and its background session task.
//! * `config`: CLI/env/`.env`/defaults configuration resolution.
//! * `logging`: process-wide `tracing` subscriber setup.
//! * `core_tools`: the native tools bundled with every server.

pub mod client;
pub mod config;
pub mod core_tools;
pub mod error;
pub mod logging;
pub mod network;
pub mod server;
pub mod tool;
pub mod wire;

/// Derives [`ToolArgumentsDescriptor`] for a struct, generating a JSON schema
/// for its fields from `#[tool_arg(...)]` attributes. Paired with
/// `serde::Deserialize` on the same struct, this is the ergonomic path to a
/// typed native tool handler that wants its arguments validated and parsed
/// in one step.
///
/// ```rust
/// use mcp_runtime::ToolArguments;
/// use serde::Deserialize;
///
/// #[derive(ToolArguments, Deserialize)]
/// struct Greet {
///     #[tool_arg(desc = "Who to greet")]
///     name: String,
///     #[tool_arg(required = false)]
///     loudly: Option<bool>,
/// }
/// ```
pub use mcp_sdk_macros::ToolArguments;

/// Implemented by types whose JSON schema can be derived automatically via
/// `#[derive(ToolArguments)]`.
pub trait ToolArgumentsDescriptor {
    fn mcp_input_schema() -> serde_json::Value;
}

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use network::{NetworkAdapter, WebSocketAdapter};
pub use server::{Server, ServerHandle, ToolRegistry};
pub use tool::{Tool, ToolHandler};
pub use wire::{ErrorCode, Request, ServerMessage, ToolDefinition};
