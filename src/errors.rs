//! Error taxonomy for the tool-server kernel.
//!
//! Each variant maps to one of the kinds described in the design: a
//! `ProtocolError` is surfaced as a JSON-RPC error object and never reaches a
//! tool handler; everything else is caught by the dispatch pipeline and
//! turned into an error envelope. `FatalError` is the only kind that exits
//! the process.

/// Malformed JSON-RPC, unknown method, or a non-object request. The server
/// stays alive; these never reach a tool handler.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Input failed schema validation before the inner handler ran.
#[derive(Debug, thiserror::Error)]
#[error("Input validation failed: {0}")]
pub struct ValidationError(pub String);

/// Unknown tool, unknown connection id, or unknown database object.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NotFoundError(pub String);

/// Pool exhaustion, connection closed, I/O failure, HTTP non-2xx,
/// unsupported content type, or a timeout.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ResourceError(pub String);

/// A semantic rejection by a handler: empty data map, invalid alter-table
/// action, too many URLs in a batch, and so on.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DomainError(pub String);

/// Startup failure only. Causes the process to exit with code 1.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("Failed to attach transport: {0}")]
    Transport(String),

    #[error("Failed to validate runtime environment: {0}")]
    Environment(String),

    #[error("Module initialization failed: {0}")]
    ModuleInit(String),
}

/// The unified failure type a tool handler may return. The dispatch
/// pipeline (`crate::dispatch`) is the single place this is converted into
/// an error envelope; handlers never construct error envelopes themselves
/// for these cases.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Other(String),
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::Other(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::Other(message.to_string())
    }
}
