//! The canonical success/error response shape returned by every tool.
//!
//! An [`Envelope`] is a value — constructed once, never mutated. The two
//! constructors are the only way to build one, which keeps the
//! `"Error: "` wire contract (clients rely on it to tell success from
//! failure independently of `is_error`) in exactly one place.

/// One part of an envelope's `content` sequence.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// The uniform `{content, is_error}` value returned by every tool.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Envelope {
    pub content: Vec<ContentPart>,
    pub is_error: bool,
}

impl Envelope {
    /// A successful result whose single text part is `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// An error result. The text always begins with `"Error: "` — this is a
    /// wire-level contract, not a formatting nicety.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            content: vec![ContentPart {
                kind: "text",
                text: format!("Error: {message}"),
            }],
            is_error: true,
        }
    }

    /// Pretty-print a JSON value as the single success text part.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::text(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// First text part, if any — used by tests and by the kernel when
    /// embedding the envelope as a `tools/call` result.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|p| p.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_not_an_error() {
        let env = Envelope::text("ok");
        assert!(!env.is_error());
        assert_eq!(env.first_text(), Some("ok"));
    }

    #[test]
    fn error_always_begins_with_error_prefix() {
        let env = Envelope::error("boom");
        assert!(env.is_error());
        assert_eq!(env.first_text(), Some("Error: boom"));
    }

    #[test]
    fn content_is_never_empty() {
        let env = Envelope::text("x");
        assert!(!env.content.is_empty());
        for part in &env.content {
            assert_eq!(part.kind, "text");
        }
    }
}
