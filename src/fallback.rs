//! Built-in default content used when the model fails validation twice.
//!
//! The game must never dead-end on an LLM hiccup, so every pending operation
//! has a canned payload that satisfies the same invariants as a validated
//! one.

use crate::schema::{Question, StatusUpdate, TopicSet};

pub fn fallback_topics() -> TopicSet {
    TopicSet {
        topics: vec![
            "Classic Rock".to_string(),
            "Pop Hits".to_string(),
            "Jazz Legends".to_string(),
        ],
    }
}

/// A canned question, lightly themed on the requested topic. Options and the
/// correct answer are fixed so the contract invariants hold by construction.
pub fn fallback_question(topic: &str) -> Question {
    Question {
        text: format!(
            "While the {topic} archive warms back up: which note is the orchestra tuning to before a concert?"
        ),
        options: vec![
            "A".to_string(),
            "C".to_string(),
            "E flat".to_string(),
            "G sharp".to_string(),
        ],
        correct_answer: "A".to_string(),
        comment: "Concert pitch: the oboe sounds an A and everyone falls in line.".to_string(),
    }
}

pub fn fallback_status() -> StatusUpdate {
    StatusUpdate {
        tone: "normal".to_string(),
        conductor_comment: "The conductor taps the stand and the show goes on.".to_string(),
        score_delta: None,
        difficulty: None,
    }
}

/// Notice shown when fallback content had to stand in for the model.
pub const FALLBACK_NOTICE: &str =
    "The quiz master lost its train of thought; continuing with the house repertoire.";

/// Notice shown when a question fetch was abandoned back to topic selection.
pub const APOLOGY_NOTICE: &str =
    "Sorry, that topic would not come together. Please pick again.";
