//! Prompt composition for the three request kinds.
//!
//! Every prompt embeds the current tone/difficulty/history so follow-up
//! generations stay coherent, and ends with schemars-generated schema
//! guidance so the model knows the exact envelope to emit.

use crate::rules::RoundOutcome;
use crate::schema::{Question, StatusUpdate, TopicSet, OPTION_COUNT, TOPIC_COUNT};
use crate::session::SessionState;
use schemars::{schema_for, JsonSchema};

/// Append JSON schema guidance for `T` to a prompt.
fn with_schema_guidance<T: JsonSchema>(prompt: String) -> String {
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nRespond with a single JSON object matching this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}

fn persona(state: &SessionState) -> String {
    let mut p = format!(
        "You are the conductor of a music trivia game. Your current mood is {}.",
        state.tone
    );
    if !state.history_summary.is_empty() {
        p.push_str(&format!(" Recent play: {}", state.history_summary));
    }
    p
}

pub fn topics_prompt(state: &SessionState) -> String {
    let prompt = format!(
        "{}\nOffer the player {TOPIC_COUNT} distinct music trivia topics to choose from. Keep each topic short.",
        persona(state)
    );
    with_schema_guidance::<TopicSet>(prompt)
}

pub fn question_prompt(state: &SessionState, topic: &str) -> String {
    let prompt = format!(
        "{}\nWrite one {} multiple-choice music trivia question about \"{topic}\" with exactly {OPTION_COUNT} options. \
         The correctAnswer must repeat one option verbatim. Add a one-line comment to read after the reveal.",
        persona(state),
        state.difficulty,
    );
    with_schema_guidance::<Question>(prompt)
}

pub fn status_prompt(state: &SessionState, outcome: &RoundOutcome, question: &Question) -> String {
    let verdict = if outcome.correct {
        "answered correctly"
    } else {
        "answered incorrectly"
    };
    let prompt = format!(
        "{}\nThe player just {verdict}. The question was: {:?} (correct answer: {:?}). \
         The score is now {}. React in character with a short conductor_comment and a suggested tone.",
        persona(state),
        question.text,
        question.correct_answer,
        outcome.new_score,
    );
    with_schema_guidance::<StatusUpdate>(prompt)
}

/// Preamble for the single retry after a malformed or invalid response.
pub fn corrective(prompt: &str) -> String {
    format!(
        "Your previous reply could not be parsed. Answer again, and this time emit exactly one JSON object and nothing else.\n\n{prompt}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::QuizSession;

    #[test]
    fn prompts_embed_tone_and_schema_guidance() {
        let session = QuizSession::new();
        let prompt = topics_prompt(session.state());
        assert!(prompt.contains("normal"));
        assert!(prompt.contains("## Response Format"));
        assert!(prompt.contains("topics"));
    }

    #[test]
    fn question_prompt_names_topic_and_difficulty() {
        let session = QuizSession::new();
        let prompt = question_prompt(session.state(), "Motown");
        assert!(prompt.contains("Motown"));
        assert!(prompt.contains("very easy"));
        assert!(prompt.contains("correctAnswer"));
    }

    #[test]
    fn corrective_preamble_wraps_the_original() {
        let wrapped = corrective("base prompt");
        assert!(wrapped.starts_with("Your previous reply"));
        assert!(wrapped.ends_with("base prompt"));
    }
}
