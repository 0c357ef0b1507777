use quiz_conductor::rules::{Difficulty, RuleTable, Tone};
use quiz_conductor::schema::Question;
use quiz_conductor::session::{Advance, Phase, QuizSession};

fn question(correct: &str) -> Question {
    Question {
        text: "Which composer went deaf?".to_string(),
        options: vec![
            "Beethoven".to_string(),
            "Brahms".to_string(),
            "Schubert".to_string(),
            "Haydn".to_string(),
        ],
        correct_answer: correct.to_string(),
        comment: "He kept composing regardless.".to_string(),
    }
}

fn quiz_session() -> QuizSession {
    let mut session = QuizSession::new();
    assert!(!session.apply_topics(session.generation()).is_stale());
    let gen = session.choose_topic("Composers").unwrap();
    assert!(!session.apply_question(gen, question("Beethoven")).is_stale());
    session
}

#[test]
fn score_changes_only_through_the_rule_table() {
    let table = RuleTable::default();
    let mut session = quiz_session();
    // Three consecutive correct answers: exactly 3 * correct_delta.
    for round in 1..=3 {
        let (outcome, _) = session.grade_answer("Beethoven", &table).unwrap();
        assert_eq!(outcome.new_score, round * table.correct_delta);
        match session.advance(table.win_threshold).unwrap() {
            Advance::NextQuestion { generation, .. } => {
                assert!(!session
                    .apply_question(generation, question("Beethoven"))
                    .is_stale());
            }
            Advance::Won { .. } => panic!("should not win at {round} rounds"),
        }
    }
}

#[test]
fn grading_ignores_everything_but_the_stored_answer() {
    let table = RuleTable::default();
    let mut session = quiz_session();
    let (outcome, answered) = session.grade_answer("Brahms", &table).unwrap();
    assert!(!outcome.correct);
    assert_eq!(answered.correct_answer, "Beethoven");
    // Status handling is tone-only: whatever the model later claims cannot
    // rewrite the verdict or the score.
    let gen = session.generation();
    assert!(!session.apply_status(gen, Some(Tone::Excited)).is_stale());
    assert_eq!(session.state().score, 0);
    assert_eq!(session.state().tone, Tone::Excited);
}

#[test]
fn stale_response_after_restart_is_discarded() {
    let mut session = quiz_session();
    let table = RuleTable::default();
    session.grade_answer("Beethoven", &table).unwrap();
    let stale_gen = match session.advance(table.win_threshold).unwrap() {
        Advance::NextQuestion { generation, .. } => generation,
        other => panic!("expected NextQuestion, got {other:?}"),
    };

    // The player restarts while that question request is in flight.
    session.restart();
    assert!(session.apply_question(stale_gen, question("Haydn")).is_stale());

    // The new session proceeds untouched by the slow response.
    assert_eq!(session.state().score, 0);
    assert!(session.state().current_question.is_none());
    assert!(!session.apply_topics(session.generation()).is_stale());
    let gen = session.choose_topic("Film Scores").unwrap();
    assert!(!session.apply_question(gen, question("Beethoven")).is_stale());
    assert_eq!(
        session.state().current_question.as_ref().unwrap().correct_answer,
        "Beethoven"
    );
}

#[test]
fn phase_question_invariant_holds_across_the_loop() {
    let table = RuleTable::default();
    let mut session = quiz_session();
    assert_eq!(session.state().phase, Phase::Quiz);
    assert!(session.state().current_question.is_some());

    session.grade_answer("Beethoven", &table).unwrap();
    assert_eq!(session.state().phase, Phase::QuizResult);
    assert!(session.state().current_question.is_none());
}

#[test]
fn difficulty_walks_one_step_at_a_time() {
    let table = RuleTable::default();
    let mut session = quiz_session();
    let mut previous = session.state().difficulty;
    for _ in 0..8 {
        let (outcome, _) = session.grade_answer("Beethoven", &table).unwrap();
        let rank = |d: Difficulty| d as i32;
        assert!((rank(outcome.new_difficulty) - rank(previous)).abs() <= 1);
        previous = outcome.new_difficulty;
        match session.advance(i64::MAX).unwrap() {
            Advance::NextQuestion { generation, .. } => {
                assert!(!session
                    .apply_question(generation, question("Beethoven"))
                    .is_stale());
            }
            Advance::Won { .. } => unreachable!(),
        }
    }
}
