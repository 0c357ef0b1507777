//! The three response contracts the model is prompted to fulfil.
//!
//! Field names mirror what the prompts ask for, so serde renames are the
//! single source of truth for the wire shape. Every record derives
//! `JsonSchema` so prompt builders can embed schema guidance.

use crate::error::ExtractError;
use crate::extract::LlmPayload;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The number of answer options every question must carry.
pub const OPTION_COUNT: usize = 4;

/// The number of topics a topic set must offer.
pub const TOPIC_COUNT: usize = 3;

/// A set of candidate trivia topics for the player to choose from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TopicSet {
    /// Exactly three distinct music subjects, e.g. "90s Grunge".
    pub topics: Vec<String>,
}

impl LlmPayload for TopicSet {
    const SCHEMA_NAME: &'static str = "TopicSet";
    const REQUIRED_FIELDS: &'static [&'static str] = &["topics"];

    fn validate(&self) -> Result<(), ExtractError> {
        if self.topics.len() != TOPIC_COUNT {
            return Err(ExtractError::SchemaViolation {
                schema: Self::SCHEMA_NAME,
                detail: format!("expected {} topics, got {}", TOPIC_COUNT, self.topics.len()),
            });
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(ExtractError::SchemaViolation {
                schema: Self::SCHEMA_NAME,
                detail: "empty topic".to_string(),
            });
        }
        for (i, topic) in self.topics.iter().enumerate() {
            if self.topics[..i].contains(topic) {
                return Err(ExtractError::SchemaViolation {
                    schema: Self::SCHEMA_NAME,
                    detail: format!("duplicate topic: {topic}"),
                });
            }
        }
        Ok(())
    }
}

/// One multiple-choice trivia question.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Question {
    /// The question itself.
    pub text: String,
    /// Exactly four distinct answer options.
    pub options: Vec<String>,
    /// Must match one of `options` exactly.
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    /// Flavor commentary shown after the answer is revealed.
    pub comment: String,
}

impl LlmPayload for Question {
    const SCHEMA_NAME: &'static str = "Question";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["text", "options", "correctAnswer", "comment"];

    fn validate(&self) -> Result<(), ExtractError> {
        if self.options.len() != OPTION_COUNT {
            return Err(ExtractError::SchemaViolation {
                schema: Self::SCHEMA_NAME,
                detail: format!("expected {} options, got {}", OPTION_COUNT, self.options.len()),
            });
        }
        for (i, option) in self.options.iter().enumerate() {
            if self.options[..i].contains(option) {
                return Err(ExtractError::SchemaViolation {
                    schema: Self::SCHEMA_NAME,
                    detail: format!("duplicate option: {option}"),
                });
            }
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(ExtractError::SchemaViolation {
                schema: Self::SCHEMA_NAME,
                detail: format!("correctAnswer {:?} is not one of the options", self.correct_answer),
            });
        }
        Ok(())
    }
}

/// Post-round commentary from the model.
///
/// `tone` is consulted (accepted only when it names a known tone) and
/// `conductor_comment` is shown verbatim. The numeric fields are advisory
/// only: score and difficulty transitions are computed by the rule table,
/// never taken from the model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StatusUpdate {
    /// Suggested conversational mood, e.g. "excited" or "sassy".
    pub tone: String,
    /// Conductor's one-liner about the round just played.
    pub conductor_comment: String,
    /// Advisory score delta. Logged, never applied.
    #[serde(default)]
    pub score_delta: Option<i64>,
    /// Advisory difficulty label. Logged, never applied.
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl LlmPayload for StatusUpdate {
    const SCHEMA_NAME: &'static str = "StatusUpdate";
    const REQUIRED_FIELDS: &'static [&'static str] = &["tone", "conductor_comment"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::parse_payload;

    fn question(options: &[&str], correct: &str) -> Question {
        Question {
            text: "Who composed it?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            comment: "A classic.".to_string(),
        }
    }

    #[test]
    fn valid_question_passes() {
        question(&["Bach", "Mozart", "Liszt", "Holst"], "Holst")
            .validate()
            .unwrap();
    }

    #[test]
    fn wrong_option_count_fails() {
        let err = question(&["Bach", "Mozart", "Liszt"], "Bach")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("options"));
    }

    #[test]
    fn correct_answer_must_be_member_equal() {
        let err = question(&["Bach", "Mozart", "Liszt", "Holst"], "holst")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("not one of the options"));
    }

    #[test]
    fn duplicate_options_fail() {
        let err = question(&["Bach", "Bach", "Liszt", "Holst"], "Bach")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn topic_set_rejects_two_topics() {
        let set = TopicSet {
            topics: vec!["Rock".to_string(), "Pop".to_string()],
        };
        assert!(set.validate().is_err());
    }

    #[test]
    fn question_parses_from_fenced_response() {
        let raw = r#"Here you go!
```json
{"text": "Which band released 'Nevermind'?",
 "options": ["Nirvana", "Pearl Jam", "Soundgarden", "Alice in Chains"],
 "correctAnswer": "Nirvana",
 "comment": "1991, the year punk broke."}
```"#;
        let q: Question = parse_payload(raw).unwrap();
        assert_eq!(q.correct_answer, "Nirvana");
        assert_eq!(q.options.len(), 4);
    }

    #[test]
    fn status_update_numeric_fields_are_optional() {
        let s: StatusUpdate =
            parse_payload(r#"{"tone": "excited", "conductor_comment": "Bravo!"}"#).unwrap();
        assert!(s.score_delta.is_none());
        assert!(s.difficulty.is_none());
    }
}
