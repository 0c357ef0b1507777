use thiserror::Error;

/// Failures turning raw model text into a validated payload.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no parseable JSON object in model output")]
    MalformedOutput {
        /// Raw model text, kept for diagnostics.
        raw: String,
    },
    #[error("{schema} schema violation: {detail}")]
    SchemaViolation {
        schema: &'static str,
        detail: String,
    },
}

impl ExtractError {
    /// Short tag used for retry bookkeeping and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::MalformedOutput { .. } => "malformed_output",
            ExtractError::SchemaViolation { .. } => "schema_violation",
        }
    }
}

/// Failures of the LLM call itself (network, provider, timeout).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
    #[error("Request timed out")]
    Timeout,
    #[error("Mock error: {0}")]
    Mock(String),
}

/// Boundary error for session driver operations.
///
/// Extraction and backend failures are absorbed by the driver's
/// retry/fallback policy and normally never escape; what remains here are
/// programming errors (a command issued in the wrong phase) and exhausted
/// fallbacks that have no well-defined recovery.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),
    #[error("Max retries exceeded")]
    MaxRetriesExceeded,
    #[error("Command {command} not valid in phase {phase}")]
    InvalidCommand {
        command: &'static str,
        phase: &'static str,
    },
    #[error("Store error: {0}")]
    Store(String),
}
