//! The synchronous quiz session core.
//!
//! `QuizSession` owns the one mutable `SessionState` and is the only thing
//! allowed to change it. It is deliberately free of I/O: the async driver
//! composes prompts and awaits the backend, then feeds validated payloads
//! back in through the `apply_*` methods. Each apply takes the `Generation`
//! token that was current when the request started; a token from before a
//! restart is rejected so a slow response can never land in the wrong
//! session.

use crate::error::SessionError;
use crate::extract::LlmPayload;
use crate::rules::{Difficulty, RoundOutcome, RuleTable, Tone};
use crate::schema::Question;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::{debug, info};

const HISTORY_ROUNDS: usize = 5;

/// Where the session currently is. `Quiz` is the only phase with a pending
/// unanswered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    TopicSelect,
    Quiz,
    QuizResult,
    Won,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::TopicSelect => "topic_select",
            Phase::Quiz => "quiz",
            Phase::QuizResult => "quiz_result",
            Phase::Won => "won",
        }
    }
}

/// Token tying an in-flight backend request to the session generation that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Result of feeding a response into the session: applied, or discarded
/// because the session moved on (restart) since the request began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Apply {
    Applied,
    Stale,
}

impl Apply {
    pub fn is_stale(&self) -> bool {
        matches!(self, Apply::Stale)
    }
}

/// The single mutable entity of a game session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub score: i64,
    pub difficulty: Difficulty,
    pub tone: Tone,
    pub last_topic: Option<String>,
    /// Short synopsis of recent rounds, carried into every prompt.
    pub history_summary: String,
    /// Present iff `phase == Phase::Quiz`.
    pub current_question: Option<Question>,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            score: 0,
            difficulty: Difficulty::VeryEasy,
            tone: Tone::Normal,
            last_topic: None,
            history_summary: String::new(),
            current_question: None,
            phase: Phase::Loading,
            started_at: Utc::now(),
        }
    }
}

/// What `advance` decided after a round result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Score reached the win threshold; session is over.
    Won { final_score: i64 },
    /// Fetch the next question on `topic`; token guards the request.
    NextQuestion { topic: String, generation: Generation },
}

/// One player's session. Created once per game, never shared across sessions.
#[derive(Debug)]
pub struct QuizSession {
    state: SessionState,
    generation: u64,
    history: VecDeque<String>,
    round: u32,
}

impl QuizSession {
    pub fn new() -> Self {
        info!(target: "quiz_conductor::session", "starting new session");
        Self {
            state: SessionState::fresh(),
            generation: 0,
            history: VecDeque::new(),
            round: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        Generation(self.generation)
    }

    /// Throw the session away and start over. In-flight responses issued
    /// before this call will be rejected as stale.
    pub fn restart(&mut self) -> Generation {
        info!(target: "quiz_conductor::session", old_score = self.state.score, "session restart");
        self.state = SessionState::fresh();
        self.history.clear();
        self.round = 0;
        self.generation += 1;
        Generation(self.generation)
    }

    /// Adopt score/difficulty/tone from a stored snapshot. Only meaningful
    /// before the first round; the pending question is never resumed.
    pub fn resume_from(&mut self, snapshot: &crate::store::SessionSnapshot) {
        info!(
            target: "quiz_conductor::session",
            score = snapshot.score,
            "resuming session from snapshot"
        );
        self.state.score = snapshot.score;
        self.state.difficulty = snapshot.difficulty;
        self.state.tone = snapshot.tone;
        self.state.last_topic = snapshot.last_topic.clone();
        self.state.history_summary = snapshot.history_summary.clone();
    }

    fn check(&self, token: Generation) -> Apply {
        if token.0 == self.generation {
            Apply::Applied
        } else {
            debug!(
                target: "quiz_conductor::session",
                token = token.0,
                current = self.generation,
                "discarding stale response"
            );
            Apply::Stale
        }
    }

    /// Topic set arrived (validated or fallback). Moves to topic selection.
    pub fn apply_topics(&mut self, token: Generation) -> Apply {
        if self.check(token).is_stale() {
            return Apply::Stale;
        }
        self.state.phase = Phase::TopicSelect;
        self.state.current_question = None;
        Apply::Applied
    }

    /// Player picked a topic. Records it and enters loading for the question
    /// fetch; the returned token guards that fetch.
    pub fn choose_topic(&mut self, topic: &str) -> Result<Generation, SessionError> {
        if self.state.phase != Phase::TopicSelect {
            return Err(SessionError::InvalidCommand {
                command: "choose_topic",
                phase: self.state.phase.name(),
            });
        }
        self.state.last_topic = Some(topic.to_string());
        self.state.phase = Phase::Loading;
        Ok(Generation(self.generation))
    }

    /// A validated question arrived. Installs it and enters the quiz phase.
    pub fn apply_question(&mut self, token: Generation, question: Question) -> Apply {
        if self.check(token).is_stale() {
            return Apply::Stale;
        }
        debug_assert!(question.validate().is_ok());
        self.state.current_question = Some(question);
        self.state.phase = Phase::Quiz;
        Apply::Applied
    }

    /// Question fetch failed past the retry bound. Returns to topic
    /// selection; the caller surfaces the apology notice.
    pub fn abandon_question(&mut self, token: Generation) -> Apply {
        if self.check(token).is_stale() {
            return Apply::Stale;
        }
        self.state.current_question = None;
        self.state.phase = Phase::TopicSelect;
        Apply::Applied
    }

    /// Grade a submitted answer and apply the rule table.
    ///
    /// Correctness is a pure function of the guess and the stored correct
    /// answer; no model output is consulted. Returns the outcome and the
    /// answered question (for revealing answer and comment). The session
    /// moves to `QuizResult`; the win transition itself happens in
    /// [`QuizSession::advance`].
    pub fn grade_answer(
        &mut self,
        guess: &str,
        table: &RuleTable,
    ) -> Result<(RoundOutcome, Question), SessionError> {
        if self.state.phase != Phase::Quiz {
            return Err(SessionError::InvalidCommand {
                command: "submit_answer",
                phase: self.state.phase.name(),
            });
        }
        // Phase invariant: Quiz implies a question is present.
        let question = self
            .state
            .current_question
            .take()
            .expect("phase Quiz without a current question");

        let correct = guess == question.correct_answer;
        let outcome = self.state.apply_outcome(table, correct);
        self.round += 1;
        self.push_history(correct, outcome.new_score);
        self.state.phase = Phase::QuizResult;

        info!(
            target: "quiz_conductor::session",
            round = self.round,
            correct,
            score = outcome.new_score,
            difficulty = %outcome.new_difficulty,
            "answer graded"
        );
        Ok((outcome, question))
    }

    /// Post-round status arrived. Only a recognized suggested tone is taken;
    /// everything else about the update is flavor handled by the caller.
    pub fn apply_status(&mut self, token: Generation, suggested_tone: Option<Tone>) -> Apply {
        if self.check(token).is_stale() {
            return Apply::Stale;
        }
        if let Some(tone) = suggested_tone {
            self.state.tone = tone;
        }
        Apply::Applied
    }

    /// Decide what happens after a round result: win, or the next question
    /// on the same topic.
    pub fn advance(&mut self, win_threshold: i64) -> Result<Advance, SessionError> {
        if self.state.phase != Phase::QuizResult {
            return Err(SessionError::InvalidCommand {
                command: "continue",
                phase: self.state.phase.name(),
            });
        }
        if self.state.score >= win_threshold {
            self.state.phase = Phase::Won;
            return Ok(Advance::Won {
                final_score: self.state.score,
            });
        }
        let topic = self
            .state
            .last_topic
            .clone()
            .unwrap_or_else(|| "music".to_string());
        self.state.phase = Phase::Loading;
        Ok(Advance::NextQuestion {
            topic,
            generation: Generation(self.generation),
        })
    }

    fn push_history(&mut self, correct: bool, score: i64) {
        let topic = self.state.last_topic.as_deref().unwrap_or("music");
        let verdict = if correct { "nailed" } else { "missed" };
        self.history
            .push_back(format!("Round {}: {verdict} a {topic} question ({score} pts).", self.round));
        while self.history.len() > HISTORY_ROUNDS {
            self.history.pop_front();
        }
        self.state.history_summary = self
            .history
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    fn apply_outcome(&mut self, table: &RuleTable, correct: bool) -> RoundOutcome {
        let outcome = table.apply(self.score, self.difficulty, correct);
        self.score = outcome.new_score;
        self.difficulty = outcome.new_difficulty;
        self.tone = outcome.new_tone;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            text: "Which instrument has 47 strings?".to_string(),
            options: vec![
                "Harp".to_string(),
                "Lute".to_string(),
                "Sitar".to_string(),
                "Zither".to_string(),
            ],
            correct_answer: "Harp".to_string(),
            comment: "Concert harps carry 47.".to_string(),
        }
    }

    fn session_in_quiz() -> QuizSession {
        let mut session = QuizSession::new();
        let gen = session.generation();
        assert_eq!(session.apply_topics(gen), Apply::Applied);
        let gen = session.choose_topic("Orchestral").unwrap();
        assert_eq!(session.apply_question(gen, sample_question()), Apply::Applied);
        session
    }

    #[test]
    fn quiz_phase_implies_question_present() {
        let session = session_in_quiz();
        assert_eq!(session.state().phase, Phase::Quiz);
        assert!(session.state().current_question.is_some());
    }

    #[test]
    fn grading_is_local_and_clears_the_question() {
        let mut session = session_in_quiz();
        let (outcome, question) = session.grade_answer("Harp", &RuleTable::default()).unwrap();
        assert!(outcome.correct);
        assert_eq!(question.correct_answer, "Harp");
        assert_eq!(session.state().phase, Phase::QuizResult);
        assert!(session.state().current_question.is_none());
    }

    #[test]
    fn wrong_guess_is_graded_incorrect() {
        let mut session = session_in_quiz();
        let (outcome, _) = session.grade_answer("Lute", &RuleTable::default()).unwrap();
        assert!(!outcome.correct);
        assert_eq!(session.state().score, 0);
    }

    #[test]
    fn submit_outside_quiz_phase_is_rejected() {
        let mut session = QuizSession::new();
        let err = session
            .grade_answer("Harp", &RuleTable::default())
            .unwrap_err();
        assert!(err.to_string().contains("submit_answer"));
    }

    #[test]
    fn restart_invalidates_in_flight_tokens() {
        let mut session = QuizSession::new();
        let stale = session.generation();
        session.restart();
        assert!(session.apply_topics(stale).is_stale());
        // A question from the old session must not install either.
        assert!(session.apply_question(stale, sample_question()).is_stale());
        assert!(session.state().current_question.is_none());
    }

    #[test]
    fn advance_below_threshold_reloads_same_topic() {
        let mut session = session_in_quiz();
        session.grade_answer("Harp", &RuleTable::default()).unwrap();
        match session.advance(1000).unwrap() {
            Advance::NextQuestion { topic, .. } => assert_eq!(topic, "Orchestral"),
            other => panic!("expected NextQuestion, got {other:?}"),
        }
        assert_eq!(session.state().phase, Phase::Loading);
    }

    #[test]
    fn advance_at_threshold_wins() {
        let mut session = session_in_quiz();
        session.grade_answer("Harp", &RuleTable::default()).unwrap();
        match session.advance(100).unwrap() {
            Advance::Won { final_score } => assert_eq!(final_score, 100),
            other => panic!("expected Won, got {other:?}"),
        }
        assert_eq!(session.state().phase, Phase::Won);
    }

    #[test]
    fn history_summary_tracks_recent_rounds_only() {
        let mut session = session_in_quiz();
        let table = RuleTable::default();
        for i in 0..7 {
            session.grade_answer("Harp", &table).unwrap();
            match session.advance(10_000).unwrap() {
                Advance::NextQuestion { generation, .. } => {
                    assert_eq!(session.apply_question(generation, sample_question()), Apply::Applied);
                }
                Advance::Won { .. } => panic!("threshold too low at round {i}"),
            }
        }
        let summary = &session.state().history_summary;
        assert!(!summary.contains("Round 1:"), "old rounds should age out: {summary}");
        assert!(summary.contains("Round 7:"));
    }

    #[test]
    fn fallback_question_satisfies_the_contract() {
        // Guard against a fallback that would itself violate invariants.
        crate::fallback::fallback_question("Rock").validate().unwrap();
    }
}
