//! The single choke-point where internal failures become error envelopes.
//!
//! Every registered tool is invoked through [`dispatch`]: validate, time,
//! invoke, log, convert. Handlers are free to fail by returning a
//! [`HandlerError`](crate::errors::HandlerError); they never construct error
//! envelopes themselves for that path.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error};

use crate::registry::Tool;
use crate::response::Envelope;

/// Validate arguments, invoke the tool's handler, and convert any failure
/// into an error envelope. This is called once per `tools/call`.
pub async fn dispatch(tool: &Tool, raw_arguments: Value) -> Envelope {
    let start = Instant::now();

    let arguments = match tool.schema.validate(raw_arguments) {
        Ok(value) => value,
        Err(message) => {
            debug!(tool = %tool.name, "schema validation failed: {message}");
            return Envelope::error(message.trim_start_matches("Error: ").to_string());
        }
    };

    match (tool.handler)(arguments).await {
        Ok(envelope) => {
            let duration_ms = start.elapsed().as_millis();
            debug!(tool = %tool.name, duration_ms, success = true, "tool call completed");
            envelope
        }
        Err(failure) => {
            let duration_ms = start.elapsed().as_millis();
            error!(tool = %tool.name, duration_ms, error = %failure, "tool call failed");
            Envelope::error(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;
    use crate::registry::Tool;
    use serde_json::json;

    #[tokio::test]
    async fn validation_failure_never_invokes_handler() {
        let invoked = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let invoked2 = invoked.clone();
        let tool = Tool::new(
            "t",
            "d",
            json!({
                "type": "object",
                "properties": { "query": { "type": "string", "minLength": 1 } },
                "required": ["query"]
            }),
            move |_args| {
                let invoked = invoked2.clone();
                async move {
                    invoked.store(true, std::sync::atomic::Ordering::SeqCst);
                    Ok(Envelope::text("ok"))
                }
            },
        );

        let envelope = dispatch(&tool, json!({ "query": "" })).await;
        assert!(envelope.is_error());
        assert!(envelope.first_text().unwrap().starts_with("Error: Input validation failed:"));
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn handler_failure_becomes_error_envelope() {
        let tool = Tool::new("t", "d", json!({"type": "object"}), |_args| async {
            Err(DomainError("nope".to_string()).into())
        });
        let envelope = dispatch(&tool, json!({})).await;
        assert!(envelope.is_error());
        assert_eq!(envelope.first_text(), Some("Error: nope"));
    }

    #[tokio::test]
    async fn handler_success_passes_through_verbatim() {
        let tool = Tool::new("t", "d", json!({"type": "object"}), |_args| async {
            Ok(Envelope::text("hello"))
        });
        let envelope = dispatch(&tool, json!({})).await;
        assert!(!envelope.is_error());
        assert_eq!(envelope.first_text(), Some("hello"));
    }
}
