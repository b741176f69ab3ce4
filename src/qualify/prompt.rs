//! Prompt construction for the qualification exchange.

use crate::types::ChatMessage;

/// Renders history as `role: text` lines, oldest first.
pub fn format_transcript(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps only the most recent `window` messages. `None` keeps everything.
pub fn truncate_history(history: &[ChatMessage], window: Option<usize>) -> &[ChatMessage] {
    match window {
        Some(size) if history.len() > size => &history[history.len() - size..],
        _ => history,
    }
}

/// Builds the full instruction sent to the model for one user utterance.
///
/// User-controlled strings are embedded as JSON string literals so quotes and
/// newlines in them cannot break the surrounding template.
pub fn build_prompt(
    history: &[ChatMessage],
    new_message: &str,
    user_email: &str,
    session_id: &str,
) -> String {
    let transcript = if history.is_empty() {
        "(no prior messages)".to_string()
    } else {
        format_transcript(history)
    };
    let quoted_input = quote(new_message);
    let quoted_email = quote(user_email);
    let quoted_session = quote(session_id);

    format!(
        r#"You are AutoQualify, an autonomous sales lead qualification agent.

GOAL: Spend less sales effort on low-quality leads and surface high-fit leads automatically.

USER-FACING BEHAVIOR:
- Reply naturally and professionally.
- Qualify the lead by asking about business needs, timeline, pain points and budget.
- Never reveal the lead score, intent detection or any admin analysis to the user.
- Treat the user as a potential customer.

ADMIN-FACING ANALYSIS (internal only):
- Look for buying signals: pricing, demo, trial, cost, buy, purchase, subscribe, timeline, budget.
- Assign a lead score from 0 to 100.
- Decide whether the lead is interested in buying: YES or NO.
- Decide the lead status: Pursuable or Not Pursuable.

CONVERSATION HISTORY:
{transcript}

CURRENT USER INPUT:
{quoted_input}

OUTPUT:
Return one JSON object with exactly two fields.
- "chatResponse": your reply to the user.
- "adminInsight": an object with
  "sessionId": {quoted_session},
  "userEmail": {quoted_email},
  "lastMessage": the current user input, verbatim,
  "score": integer from 0 to 100,
  "interested": "YES" or "NO",
  "status": "Pursuable" or "Not Pursuable",
  "detectedIntent": a brief summary of the intent,
  "reasoning": one or two concise sentences for the admin."#
    )
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
