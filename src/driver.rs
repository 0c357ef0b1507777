//! Async orchestration around the session core.
//!
//! `SessionDriver` is the piece that actually talks to the backend: it
//! composes prompts from the current state, awaits one request at a time,
//! funnels the raw text through extraction/validation, and feeds the result
//! into `QuizSession`. Failures are retried once with a corrective prompt;
//! a second failure engages the built-in fallback and a user-visible notice,
//! so the session never stays in `loading` past the retry bound.

use crate::backend::LlmBackend;
use crate::config::SessionConfig;
use crate::error::{BackendError, SessionError};
use crate::events::SessionEvent;
use crate::extract::{parse_payload, LlmPayload};
use crate::fallback;
use crate::prompt;
use crate::rules::Tone;
use crate::schema::{Question, StatusUpdate, TopicSet};
use crate::session::{Advance, Generation, QuizSession};
use crate::store::{NoopStore, SessionSnapshot, SessionStore};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

const WIN_COMMENT: &str = "A standing ovation - the conductor bows. Encore next time!";

/// Where a question fetch lands after the retry bound.
#[derive(Debug, Clone, Copy)]
enum QuestionFallback {
    /// First question on a fresh topic: apologize and re-present topics.
    TopicSelect,
    /// Mid-game follow-up: serve the built-in question instead.
    CannedQuestion,
}

/// Drives one quiz session against one LLM backend.
pub struct SessionDriver<B: LlmBackend> {
    backend: B,
    config: SessionConfig,
    session: QuizSession,
    store: Box<dyn SessionStore>,
    session_id: Option<String>,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
    last_topics: Vec<String>,
}

impl<B: LlmBackend> SessionDriver<B> {
    pub fn new(backend: B, config: SessionConfig) -> Self {
        info!(
            timeout_secs = config.request_timeout.as_secs(),
            "Creating new SessionDriver"
        );
        Self {
            backend,
            config,
            session: QuizSession::new(),
            store: Box::new(NoopStore),
            session_id: None,
            subscribers: Vec::new(),
            last_topics: Vec::new(),
        }
    }

    /// Attach a persistence store; `session_id` keys the snapshots.
    pub fn with_store<S: SessionStore + 'static>(mut self, store: S, session_id: &str) -> Self {
        self.store = Box::new(store);
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Register a UI event receiver. Multiple subscribers are fine; a dropped
    /// receiver is silently skipped.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&self, event: SessionEvent) {
        debug!(target: "quiz_conductor::driver", ?event, "emitting event");
        for tx in &self.subscribers {
            let _ = tx.send(event.clone());
        }
    }

    /// Start (or resume) the session: load any snapshot, then fetch topics.
    #[instrument(target = "quiz_conductor::driver", skip(self))]
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if let Some(id) = self.session_id.clone() {
            match self.store.load(&id).await {
                Ok(Some(snapshot)) => self.session.resume_from(&snapshot),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "snapshot load failed; starting fresh"),
            }
        }
        self.request_topics().await
    }

    /// Restart the session; any in-flight response becomes stale.
    #[instrument(target = "quiz_conductor::driver", skip(self))]
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        self.session.restart();
        self.last_topics.clear();
        self.request_topics().await
    }

    /// Fetch a topic set, falling back to the built-in list after the retry
    /// bound. Always ends in `topic_select`.
    #[instrument(target = "quiz_conductor::driver", skip(self))]
    pub async fn request_topics(&mut self) -> Result<(), SessionError> {
        let token = self.session.generation();
        let prompt = prompt::topics_prompt(self.session.state());

        let topics = match self.fetch_payload::<TopicSet>(prompt).await {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, "topic fetch exhausted retries; using fallback list");
                self.emit(SessionEvent::Notice {
                    message: fallback::FALLBACK_NOTICE.to_string(),
                });
                fallback::fallback_topics()
            }
        };

        if self.session.apply_topics(token).is_stale() {
            return Ok(());
        }
        self.last_topics = topics.topics.clone();
        self.emit(SessionEvent::TopicsReady {
            topics: topics.topics,
        });
        Ok(())
    }

    /// Player picked a topic: fetch the first question on it.
    #[instrument(target = "quiz_conductor::driver", skip(self))]
    pub async fn choose_topic(&mut self, topic: &str) -> Result<(), SessionError> {
        let token = self.session.choose_topic(topic)?;
        self.load_question(topic, token, QuestionFallback::TopicSelect)
            .await
    }

    /// Grade the guess locally, fetch post-round commentary, settle the round.
    #[instrument(target = "quiz_conductor::driver", skip(self, guess))]
    pub async fn submit_answer(&mut self, guess: &str) -> Result<(), SessionError> {
        let (outcome, question) = self.session.grade_answer(guess, &self.config.rules)?;
        self.emit(SessionEvent::GuessResult {
            correct: outcome.correct,
            correct_answer: question.correct_answer.clone(),
        });

        let token = self.session.generation();
        let prompt = prompt::status_prompt(self.session.state(), &outcome, &question);
        let status = match self.fetch_payload::<StatusUpdate>(prompt).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "status fetch exhausted retries; using neutral update");
                self.emit(SessionEvent::Notice {
                    message: fallback::FALLBACK_NOTICE.to_string(),
                });
                fallback::fallback_status()
            }
        };

        // Advisory numerics are never applied.
        if let Some(suggested) = status.score_delta {
            debug!(suggested, applied = outcome.delta, "ignoring model-suggested score delta");
        }
        if let Some(suggested) = &status.difficulty {
            debug!(%suggested, "ignoring model-suggested difficulty");
        }

        let suggested_tone = Tone::parse_suggested(&status.tone);
        if self.session.apply_status(token, suggested_tone).is_stale() {
            return Ok(());
        }

        let state = self.session.state();
        self.emit(SessionEvent::RoundResult {
            score: state.score,
            delta: outcome.delta,
            tone: state.tone,
            comment: status.conductor_comment,
        });
        self.save_snapshot().await;
        Ok(())
    }

    /// Next round on the same topic, or the win if the threshold is reached.
    #[instrument(target = "quiz_conductor::driver", skip(self))]
    pub async fn continue_round(&mut self) -> Result<(), SessionError> {
        match self.session.advance(self.config.rules.win_threshold)? {
            Advance::Won { final_score } => {
                info!(final_score, "session won");
                self.emit(SessionEvent::SessionWon {
                    final_score,
                    comment: WIN_COMMENT.to_string(),
                });
                self.save_snapshot().await;
                Ok(())
            }
            Advance::NextQuestion { topic, generation } => {
                self.load_question(&topic, generation, QuestionFallback::CannedQuestion)
                    .await
            }
        }
    }

    /// Shared question-fetch path for `choose_topic` and `continue_round`.
    /// Exhausted retries take an explicit, bounded failure path; no silent
    /// retry loop.
    async fn load_question(
        &mut self,
        topic: &str,
        token: Generation,
        on_fail: QuestionFallback,
    ) -> Result<(), SessionError> {
        let prompt = prompt::question_prompt(self.session.state(), topic);
        let fetched = self.fetch_payload::<Question>(prompt).await;
        match fetched {
            Ok(question) => self.install_question(topic, token, question),
            Err(e) => match on_fail {
                // Mid-game the topic has already proven viable; a canned
                // question keeps the round going.
                QuestionFallback::CannedQuestion => {
                    warn!(error = %e, topic, "question fetch exhausted retries; serving canned question");
                    self.emit(SessionEvent::Notice {
                        message: fallback::FALLBACK_NOTICE.to_string(),
                    });
                    self.install_question(topic, token, fallback::fallback_question(topic))
                }
                QuestionFallback::TopicSelect => {
                    warn!(error = %e, topic, "question fetch exhausted retries; returning to topic selection");
                    if self.session.abandon_question(token).is_stale() {
                        return Ok(());
                    }
                    self.emit(SessionEvent::Notice {
                        message: fallback::APOLOGY_NOTICE.to_string(),
                    });
                    let topics = if self.last_topics.is_empty() {
                        fallback::fallback_topics().topics
                    } else {
                        self.last_topics.clone()
                    };
                    self.emit(SessionEvent::TopicsReady { topics });
                    Ok(())
                }
            },
        }
    }

    fn install_question(
        &mut self,
        topic: &str,
        token: Generation,
        question: Question,
    ) -> Result<(), SessionError> {
        if self.session.apply_question(token, question.clone()).is_stale() {
            return Ok(());
        }
        self.emit(SessionEvent::QuestionReady {
            topic: topic.to_string(),
            text: question.text,
            options: question.options,
        });
        Ok(())
    }

    /// One backend call bounded by the configured timeout.
    async fn generate_once(&self, prompt: String) -> Result<String, BackendError> {
        match timeout(self.config.request_timeout, self.backend.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("backend call timed out");
                Err(BackendError::Timeout)
            }
        }
    }

    /// Call the backend and validate the response, retrying once with a
    /// corrective prompt. Timeouts and backend failures share the validation
    /// failure path.
    async fn fetch_payload<T: LlmPayload>(&self, prompt: String) -> Result<T, SessionError> {
        let mut attempt = 0usize;
        let mut current = prompt.clone();
        loop {
            let failure_kind = match self.generate_once(current.clone()).await {
                Ok(raw) => match parse_payload::<T>(&raw) {
                    Ok(payload) => {
                        debug!(schema = T::SCHEMA_NAME, attempt, "payload accepted");
                        return Ok(payload);
                    }
                    Err(e) => {
                        warn!(schema = T::SCHEMA_NAME, error = %e, attempt, "response failed validation");
                        e.kind()
                    }
                },
                Err(e) => {
                    warn!(schema = T::SCHEMA_NAME, error = %e, attempt, "backend call failed");
                    "backend"
                }
            };

            if attempt >= self.config.retry.retries_for(failure_kind) {
                return Err(SessionError::MaxRetriesExceeded);
            }
            attempt += 1;
            current = prompt::corrective(&prompt);
        }
    }

    async fn save_snapshot(&self) {
        let Some(id) = &self.session_id else {
            return;
        };
        let state = self.session.state();
        let snapshot = SessionSnapshot {
            score: state.score,
            difficulty: state.difficulty,
            tone: state.tone,
            last_topic: state.last_topic.clone(),
            history_summary: state.history_summary.clone(),
            saved_at: Utc::now(),
        };
        // Best-effort: persistence problems never interrupt play.
        if let Err(e) = self.store.save(id, &snapshot).await {
            warn!(error = %e, "snapshot save failed");
        }
    }
}
