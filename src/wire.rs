//! Wire schema: message shapes and JSON (de)serialization for the request/response
//! protocol carried one-per-frame over the WebSocket connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The all-zero UUID used as `correlation_id` when a request's header could not
/// be parsed at all.
pub const NIL_CORRELATION_ID: Uuid = Uuid::nil();

/// `{ correlation_id: UUIDv4 }`. Minted by the client, echoed unchanged by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub correlation_id: Uuid,
}

impl Header {
    pub fn new(correlation_id: Uuid) -> Self {
        Self { correlation_id }
    }

    pub fn nil() -> Self {
        Self {
            correlation_id: NIL_CORRELATION_ID,
        }
    }
}

/// The closed set of error codes the client must recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationError,
    InvalidJson,
    UnsupportedRequest,
    ToolNotFound,
    ExecutionError,
    InternalServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::UnsupportedRequest => "unsupported_request",
            ErrorCode::ToolNotFound => "tool_not_found",
            ErrorCode::ExecutionError => "execution_error",
            ErrorCode::InternalServerError => "internal_server_error",
        };
        write!(f, "{}", s)
    }
}

/// `{ code, message }`, the body of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// The body of a `tool_call` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallBody {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// A request frame. `type` is a forward-compatible discriminator; currently
/// the validator only recognizes `tool_call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    ToolCall(ToolCallBody),
    #[serde(other)]
    Unknown,
}

/// A validated inbound request: header plus a tagged body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub header: Header,
    #[serde(flatten)]
    pub body: RequestBody,
}

/// The body of a successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessBody {
    pub tool: String,
    pub result: serde_json::Value,
}

/// A response frame, discriminated by the top-level `status` field.
///
/// Modeled as a tagged sum rather than a nullable struct so that exactly one
/// of `body`/`error` is ever populated, matching `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServerMessage {
    Success {
        header: Header,
        body: SuccessBody,
        error: Option<ErrorBody>,
    },
    Error {
        header: Header,
        body: Option<SuccessBody>,
        error: ErrorBody,
    },
}

impl ServerMessage {
    pub fn success(header: Header, tool: impl Into<String>, result: serde_json::Value) -> Self {
        ServerMessage::Success {
            header,
            body: SuccessBody {
                tool: tool.into(),
                result,
            },
            error: None::<ErrorBody>,
        }
    }

    pub fn error(header: Header, code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            header,
            body: None,
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn header(&self) -> Header {
        match self {
            ServerMessage::Success { header, .. } => *header,
            ServerMessage::Error { header, .. } => *header,
        }
    }
}

/// A client-side wrapper mapping an `error` response to a recoverable error.
#[derive(Debug, Clone)]
pub struct ToolExecutionError {
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for ToolExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ToolExecutionError {}

/// `{ name, type, required }`, one entry in a `ToolDefinition`'s `args`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolArgument {
    pub name: String,
    #[serde(rename = "type")]
    pub type_hint: String,
    pub required: bool,
}

/// `{ name, description, args }`, returned by `list_tools_available`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub args: Vec<ToolArgument>,
}
