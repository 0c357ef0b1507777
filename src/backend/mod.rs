//! Low-level LLM backend abstraction.
//!
//! Implementors provide `generate`, which executes a prompt and returns the
//! raw model text. Everything above this boundary (extraction, validation,
//! retries, timeouts) is the driver's business; the session assumes nothing
//! about the provider beyond "eventually returns text or fails."

use crate::error::BackendError;
use async_trait::async_trait;
use std::env;
use std::fmt::Debug;

pub mod claude;
pub mod mock;

pub use claude::ClaudeBackend;
pub use mock::{MockBackend, MockHandle, MockResponse};

#[async_trait]
pub trait LlmBackend: Send + Sync + Debug {
    /// The only method implementations must provide.
    async fn generate(&self, prompt: String) -> Result<String, BackendError>;

    /// Clone this backend into a boxed trait object
    fn clone_box(&self) -> Box<dyn LlmBackend>;
}

impl Clone for Box<dyn LlmBackend> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl LlmBackend for Box<dyn LlmBackend> {
    async fn generate(&self, prompt: String) -> Result<String, BackendError> {
        self.as_ref().generate(prompt).await
    }

    fn clone_box(&self) -> Box<dyn LlmBackend> {
        self.as_ref().clone_box()
    }
}

/// Backend selection for binaries and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Claude,
    Mock,
}

impl Default for ClientKind {
    /// Pick the live backend when an API key is around, otherwise the mock.
    fn default() -> Self {
        if env::var("ANTHROPIC_API_KEY").is_ok()
            || std::fs::read_to_string(".env")
                .map_or(false, |content| content.contains("ANTHROPIC_API_KEY"))
        {
            Self::Claude
        } else {
            Self::Mock
        }
    }
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientKind::Claude => write!(f, "claude"),
            ClientKind::Mock => write!(f, "mock"),
        }
    }
}
