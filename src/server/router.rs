//! Classifies a validated request: either an immediate response, or a signal
//! to proceed to the executor. Never blocks, never awaits, holds no state —
//! this leaves room for cheap synchronous endpoints later without touching
//! the executor path.

use crate::wire::{ErrorCode, Header, Request, RequestBody, ServerMessage, ToolCallBody};

pub enum RouterDecision {
    Proceed {
        header: Header,
        body: ToolCallBody,
    },
    Immediate(ServerMessage),
}

pub fn route(request: Request) -> RouterDecision {
    match request.body {
        RequestBody::ToolCall(body) => RouterDecision::Proceed {
            header: request.header,
            body,
        },
        RequestBody::Unknown => RouterDecision::Immediate(ServerMessage::error(
            request.header,
            ErrorCode::UnsupportedRequest,
            "unsupported request type",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn tool_call_proceeds_with_correlation_id_preserved() {
        let id = Uuid::new_v4();
        let request: Request = serde_json::from_value(json!({
            "header": {"correlation_id": id},
            "type": "tool_call",
            "tool": "ping",
            "args": {}
        }))
        .unwrap();

        match route(request) {
            RouterDecision::Proceed { header, body } => {
                assert_eq!(header.correlation_id, id);
                assert_eq!(body.tool, "ping");
            }
            RouterDecision::Immediate(_) => panic!("expected proceed"),
        }
    }

    #[test]
    fn unknown_type_is_an_immediate_unsupported_request_response() {
        let id = Uuid::new_v4();
        let request: Request = serde_json::from_value(json!({
            "header": {"correlation_id": id},
            "type": "future_thing"
        }))
        .unwrap();

        match route(request) {
            RouterDecision::Immediate(ServerMessage::Error { header, error, .. }) => {
                assert_eq!(header.correlation_id, id);
                assert_eq!(error.code, ErrorCode::UnsupportedRequest);
            }
            _ => panic!("expected an immediate unsupported_request response"),
        }
    }
}
