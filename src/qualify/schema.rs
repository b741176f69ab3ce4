//! Response schema and strict parsing of the model's qualification reply.

use super::QualificationError;
use crate::llm::ResponseSchema;
use crate::types::{AdminInsight, Interest, LeadStatus};
use serde::Deserialize;
use serde_json::{json, Number};

pub const SCHEMA_NAME: &str = "lead_qualification";

pub const MAX_SCORE: u64 = 100;

/// The schema handed to the hosted model: two top-level fields, eight insight fields, all required.
pub fn qualification_schema() -> ResponseSchema {
    ResponseSchema::new(
        SCHEMA_NAME,
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "chatResponse": { "type": "string" },
                "adminInsight": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "sessionId": { "type": "string" },
                        "userEmail": { "type": "string" },
                        "lastMessage": { "type": "string" },
                        "score": { "type": "integer", "minimum": 0, "maximum": MAX_SCORE },
                        "interested": { "type": "string", "enum": Interest::VALUES },
                        "status": { "type": "string", "enum": LeadStatus::VALUES },
                        "detectedIntent": { "type": "string" },
                        "reasoning": { "type": "string" }
                    },
                    "required": [
                        "sessionId", "userEmail", "lastMessage", "score",
                        "interested", "status", "detectedIntent", "reasoning"
                    ]
                }
            },
            "required": ["chatResponse", "adminInsight"]
        }),
    )
}

// Wire shapes. Enumerations and the score stay loosely typed here so an
// out-of-range value is reported as a validation failure, not a parse failure.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawExchange {
    chat_response: String,
    admin_insight: RawInsight,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawInsight {
    session_id: String,
    user_email: String,
    last_message: String,
    score: Number,
    interested: String,
    status: String,
    detected_intent: String,
    reasoning: String,
}

/// A reply that passed both parsing and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExchange {
    pub chat_response: String,
    pub admin_insight: AdminInsight,
}

/// Parses and validates raw model output.
///
/// # Errors
///
/// - [`QualificationError::MalformedResponse`] when the text is not JSON, a
///   field is missing or unknown, or a field has the wrong JSON type.
/// - [`QualificationError::Validation`] when the score is not an integer in
///   0..=100, an enumerated field is outside its two literals, or the reply is blank.
pub fn parse_exchange(text: &str) -> Result<ParsedExchange, QualificationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(QualificationError::MalformedResponse(
            "empty response body".to_string(),
        ));
    }

    let raw: RawExchange = serde_json::from_str(trimmed)
        .map_err(|e| QualificationError::MalformedResponse(e.to_string()))?;

    if raw.chat_response.trim().is_empty() {
        return Err(QualificationError::Validation(
            "chatResponse is blank".to_string(),
        ));
    }

    let insight = raw.admin_insight;
    let score = validate_score(&insight.score)?;
    let interested = Interest::from_literal(&insight.interested).ok_or_else(|| {
        QualificationError::Validation(format!(
            "interested must be one of {:?}, got {:?}",
            Interest::VALUES,
            insight.interested
        ))
    })?;
    let status = LeadStatus::from_literal(&insight.status).ok_or_else(|| {
        QualificationError::Validation(format!(
            "status must be one of {:?}, got {:?}",
            LeadStatus::VALUES,
            insight.status
        ))
    })?;

    Ok(ParsedExchange {
        chat_response: raw.chat_response,
        admin_insight: AdminInsight {
            session_id: insight.session_id,
            user_email: insight.user_email,
            last_message: insight.last_message,
            score,
            interested,
            status,
            detected_intent: insight.detected_intent,
            reasoning: insight.reasoning,
        },
    })
}

/// Accepts integers in range, including integral floats such as `82.0`.
fn validate_score(score: &Number) -> Result<u8, QualificationError> {
    let out_of_range = || {
        QualificationError::Validation(format!(
            "score must be an integer in 0..={}, got {}",
            MAX_SCORE, score
        ))
    };

    if let Some(value) = score.as_u64() {
        return if value <= MAX_SCORE {
            u8::try_from(value).map_err(|_| out_of_range())
        } else {
            Err(out_of_range())
        };
    }

    match score.as_f64() {
        Some(value) if value.fract() == 0.0 && (0.0..=MAX_SCORE as f64).contains(&value) => {
            Ok(value as u8)
        }
        _ => Err(out_of_range()),
    }
}
