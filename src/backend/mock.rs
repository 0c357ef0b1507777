//! Scriptable mock backend for tests and offline play.

use crate::backend::LlmBackend;
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Raw model text returned as-is.
    Success(String),
    /// Surfaces as `BackendError::Mock`.
    Failure(String),
    /// Surfaces as `BackendError::Timeout` without actually sleeping.
    Timeout,
}

/// Shared handle for scripting a `MockBackend` and inspecting what it saw.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Convenience for queueing raw text successes.
    pub fn push_text(&self, text: impl Into<String>) {
        self.add_response(MockResponse::Success(text.into()));
    }

    /// Every prompt the backend has received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

/// Mock backend replaying scripted responses in order. An exhausted script
/// fails rather than hanging, so a test with too few responses dies loudly.
#[derive(Debug, Clone)]
pub struct MockBackend {
    handle: Arc<MockHandle>,
}

impl MockBackend {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (backend, handle) = Self::new();
        for response in responses {
            handle.add_response(response);
        }
        (backend, handle)
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn generate(&self, prompt: String) -> Result<String, BackendError> {
        self.handle.prompts.lock().unwrap().push(prompt);
        let next = self.handle.responses.lock().unwrap().pop_front();
        debug!(target: "quiz_conductor::backend", scripted = next.is_some(), "mock generate");
        match next {
            Some(MockResponse::Success(text)) => Ok(text),
            Some(MockResponse::Failure(message)) => Err(BackendError::Mock(message)),
            Some(MockResponse::Timeout) => Err(BackendError::Timeout),
            None => Err(BackendError::Mock("mock response queue empty".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn LlmBackend> {
        Box::new(self.clone())
    }
}
