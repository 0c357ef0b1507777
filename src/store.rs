//! Optional persistence between visits.
//!
//! The session is fully functional with `NoopStore`; snapshots only carry
//! what is needed to resume score/difficulty/tone, never the in-flight
//! question.

use crate::error::SessionError;
use crate::rules::{Difficulty, Tone};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What survives between visits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub score: i64,
    pub difficulty: Difficulty,
    pub tone: Tone,
    pub last_topic: Option<String>,
    pub history_summary: String,
    pub saved_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    async fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError>;
    async fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError>;
}

/// In-memory store, mostly for tests and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, SessionSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(self.inner.lock().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        self.inner
            .lock()
            .await
            .insert(session_id.to_string(), snapshot.clone());
        Ok(())
    }
}

/// Store that remembers nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopStore;

#[async_trait]
impl SessionStore for NoopStore {
    async fn load(&self, _session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(None)
    }

    async fn save(
        &self,
        _session_id: &str,
        _snapshot: &SessionSnapshot,
    ) -> Result<(), SessionError> {
        Ok(())
    }
}
