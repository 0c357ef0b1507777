//! Turning raw model text into validated payloads.
//!
//! Models rarely emit pure JSON: the object of interest is usually wrapped in
//! prose, markdown fences, or trailing commentary. This module isolates all of
//! the "sloppy text -> clean data" handling so the session layer can treat the
//! backend as if it were a strict structured-output API. No retries happen
//! here; retry policy belongs to the caller.

use crate::error::ExtractError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

/// A payload type the model is contracted to emit.
///
/// `REQUIRED_FIELDS` is checked against the raw JSON object before typed
/// deserialization so that a missing field is reported by name rather than as
/// an opaque serde error. `validate` hosts structural checks that serde cannot
/// express (option counts, membership).
pub trait LlmPayload: DeserializeOwned {
    const SCHEMA_NAME: &'static str;
    const REQUIRED_FIELDS: &'static [&'static str];

    fn validate(&self) -> Result<(), ExtractError> {
        Ok(())
    }
}

/// Extract the single JSON object embedded in `raw`.
///
/// Everything before the first `{` and after the last `}` is discarded;
/// trailing fence tokens and stray punctuation are stripped first so they
/// cannot mask the closing brace. Fails with `MalformedOutput` (carrying the
/// raw text) when no object can be recovered.
pub fn extract_object(raw: &str) -> Result<Value, ExtractError> {
    let start = raw.find('{').ok_or_else(|| ExtractError::MalformedOutput {
        raw: raw.to_string(),
    })?;
    let mut candidate = raw[start..].trim_end();

    // A fenced response often ends "}\n```" or "}```," - peel the junk so
    // rfind lands on the real closing brace.
    loop {
        let trimmed = candidate
            .trim_end()
            .trim_end_matches(|c: char| matches!(c, '`' | ',' | '.' | ';' | '\n' | '\r'));
        if trimmed.len() == candidate.len() {
            break;
        }
        candidate = trimmed;
    }

    match candidate.rfind('}') {
        Some(end) => candidate = &candidate[..=end],
        None => {
            debug!(target: "quiz_conductor::extract", raw_len = raw.len(), "no closing brace");
            return Err(ExtractError::MalformedOutput {
                raw: raw.to_string(),
            });
        }
    }

    trace!(target: "quiz_conductor::extract", candidate_len = candidate.len(), "parsing candidate");
    serde_json::from_str(candidate).map_err(|e| {
        debug!(target: "quiz_conductor::extract", error = %e, "candidate did not parse");
        ExtractError::MalformedOutput {
            raw: raw.to_string(),
        }
    })
}

/// Extract and validate a `T` from raw model text.
///
/// Pipeline: object extraction, required-field presence (naming every missing
/// field), typed deserialization, then `T::validate`. Never returns
/// partially-valid data.
pub fn parse_payload<T: LlmPayload>(raw: &str) -> Result<T, ExtractError> {
    let value = extract_object(raw)?;

    let missing: Vec<&str> = match value.as_object() {
        Some(map) => T::REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !map.contains_key(*field))
            .collect(),
        None => T::REQUIRED_FIELDS.to_vec(),
    };
    if !missing.is_empty() {
        return Err(ExtractError::SchemaViolation {
            schema: T::SCHEMA_NAME,
            detail: format!("missing required field(s): {}", missing.join(", ")),
        });
    }

    let payload: T = serde_json::from_value(value).map_err(|e| ExtractError::SchemaViolation {
        schema: T::SCHEMA_NAME,
        detail: e.to_string(),
    })?;
    payload.validate()?;

    debug!(target: "quiz_conductor::extract", schema = T::SCHEMA_NAME, "payload validated");
    Ok(payload)
}
