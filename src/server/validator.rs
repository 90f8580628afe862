//! Pure function from a raw frame to either a typed [`Request`] or an
//! [`ServerMessage`] error response.

use crate::wire::{ErrorCode, Header, Request, ServerMessage};
use serde_json::Value;

/// Parses and schema-checks one inbound frame.
///
/// Both failure modes reply with the nil correlation id: a frame that fails
/// validation hasn't necessarily even produced a trustworthy header, so the
/// reply never trusts whatever `correlation_id` the caller claimed.
pub fn validate(raw: &str) -> Result<Request, ServerMessage> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        ServerMessage::error(
            Header::nil(),
            ErrorCode::InvalidJson,
            format!("request is not valid JSON: {}", e),
        )
    })?;

    serde_json::from_value::<Request>(value).map_err(|e| {
        ServerMessage::error(
            Header::nil(),
            ErrorCode::ValidationError,
            format!("request does not match the expected schema: {}", e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{RequestBody, NIL_CORRELATION_ID};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn invalid_json_yields_invalid_json_code_and_nil_correlation_id() {
        let err = validate("not json").unwrap_err();
        match err {
            ServerMessage::Error { header, error, .. } => {
                assert_eq!(header.correlation_id, NIL_CORRELATION_ID);
                assert_eq!(error.code, ErrorCode::InvalidJson);
            }
            _ => panic!("expected an error message"),
        }
    }

    #[test]
    fn missing_body_yields_validation_error_with_nil_correlation_id() {
        let id = Uuid::new_v4();
        let raw = json!({"header": {"correlation_id": id}}).to_string();
        let err = validate(&raw).unwrap_err();
        match err {
            ServerMessage::Error { header, error, .. } => {
                assert_eq!(header.correlation_id, NIL_CORRELATION_ID);
                assert_eq!(error.code, ErrorCode::ValidationError);
            }
            _ => panic!("expected an error message"),
        }
    }

    #[test]
    fn well_formed_tool_call_parses() {
        let id = Uuid::new_v4();
        let raw = json!({
            "header": {"correlation_id": id},
            "type": "tool_call",
            "tool": "ping",
            "args": {}
        })
        .to_string();
        let request = validate(&raw).unwrap();
        assert_eq!(request.header.correlation_id, id);
        assert!(matches!(request.body, RequestBody::ToolCall(_)));
    }
}
