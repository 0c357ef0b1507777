use quiz_conductor::error::ExtractError;
use quiz_conductor::extract::{extract_object, parse_payload};
use quiz_conductor::schema::{Question, StatusUpdate, TopicSet};

#[test]
fn extract_from_prose_wrapped_object() {
    let raw = r#"Of course! Here are your topics: {"topics":["Rock","Pop","Jazz"]} - enjoy the show."#;
    let set: TopicSet = parse_payload(raw).unwrap();
    assert_eq!(set.topics, vec!["Rock", "Pop", "Jazz"]);
}

#[test]
fn extract_from_fenced_response() {
    let raw = "```json\n{\"topics\":[\"Rock\",\"Pop\",\"Jazz\"]}\n```";
    let set: TopicSet = parse_payload(raw).unwrap();
    assert_eq!(set.topics.len(), 3);
}

#[test]
fn round_trip_is_stable_under_wrapping() {
    let object = r#"{"tone":"sassy","conductor_comment":"Took you long enough."}"#;
    let bare: StatusUpdate = parse_payload(object).unwrap();
    for wrapped in [
        format!("Sure thing!\n{object}"),
        format!("{object}\n```\nDoes that work?"),
        format!("```json\n{object}\n```.,\n"),
    ] {
        let parsed: StatusUpdate = parse_payload(&wrapped).unwrap();
        assert_eq!(parsed, bare);
    }
}

#[test]
fn no_brace_fails_with_malformed_output() {
    let err = extract_object("I'm sorry, I can't produce JSON right now.").unwrap_err();
    assert!(matches!(err, ExtractError::MalformedOutput { .. }));
}

#[test]
fn question_with_three_options_is_a_schema_violation() {
    let raw = r#"{"text":"?","options":["a","b","c"],"correctAnswer":"a","comment":"x"}"#;
    let err = parse_payload::<Question>(raw).unwrap_err();
    match err {
        ExtractError::SchemaViolation { schema, detail } => {
            assert_eq!(schema, "Question");
            assert!(detail.contains("options"));
        }
        other => panic!("expected SchemaViolation, got {other:?}"),
    }
}

#[test]
fn question_with_foreign_correct_answer_is_a_schema_violation() {
    let raw = r#"{"text":"?","options":["a","b","c","d"],"correctAnswer":"e","comment":"x"}"#;
    assert!(matches!(
        parse_payload::<Question>(raw),
        Err(ExtractError::SchemaViolation { .. })
    ));
}

#[test]
fn missing_required_fields_are_named_in_the_error() {
    let raw = r#"{"text":"?","options":["a","b","c","d"]}"#;
    let err = parse_payload::<Question>(raw).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("correctAnswer"), "{message}");
    assert!(message.contains("comment"), "{message}");
}

#[test]
fn validated_question_always_holds_the_contract() {
    let raw = r#"Commentary first.
{"text":"Which key has three sharps?",
 "options":["A major","C major","F major","B flat major"],
 "correctAnswer":"A major",
 "comment":"A, E and B, in order of appearance."}
Commentary after."#;
    let q: Question = parse_payload(raw).unwrap();
    assert_eq!(q.options.len(), 4);
    assert!(q.options.contains(&q.correct_answer));
}
