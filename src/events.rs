//! State-change notifications for the presentation layer.
//!
//! The driver pushes these over an unbounded channel; a dropped receiver is
//! not an error (the session keeps running headless). Payloads carry the
//! minimum the UI needs, nothing of the internal state.

use crate::rules::Tone;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Topics are ready for selection.
    TopicsReady { topics: Vec<String> },
    /// A question is installed and input is unblocked.
    QuestionReady {
        topic: String,
        text: String,
        options: Vec<String>,
    },
    /// The guess was graded locally.
    GuessResult {
        correct: bool,
        correct_answer: String,
    },
    /// The round settled: score applied, commentary attached.
    RoundResult {
        score: i64,
        delta: i64,
        tone: Tone,
        comment: String,
    },
    /// The win threshold was reached; the session is over.
    SessionWon { final_score: i64, comment: String },
    /// Human-readable notice, e.g. that fallback content is in play.
    Notice { message: String },
}
