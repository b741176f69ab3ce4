//! Google Gemini client
//!
//! Talks to the REST `models/{model}:generateContent` endpoint directly with
//! reqwest. Structured output is requested through `generationConfig`:
//!
//! ```json
//! {
//!   "contents": [{ "role": "user", "parts": [{ "text": "..." }] }],
//!   "generationConfig": {
//!     "responseMimeType": "application/json",
//!     "responseSchema": { "type": "OBJECT", ... }
//!   }
//! }
//! ```

use crate::llm::client::{build_http_client, LLMClient, ResponseSchema};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            api_key,
            api_base,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(prompt: &str, schema: &ResponseSchema) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": to_gemini_schema(&schema.schema)
            }
        })
    }

    /// Concatenates the text parts of the first candidate.
    ///
    /// A reply without candidates yields an empty string; the caller treats
    /// that as a malformed payload rather than a transport failure.
    fn extract_text(response: GenerateContentResponse) -> String {
        let Some(candidate) = response.candidates.into_iter().next() else {
            tracing::debug!("Gemini returned no candidates");
            return String::new();
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                tracing::debug!(finish_reason = reason, "Gemini candidate did not finish cleanly");
            }
        }

        candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

/// Translates a JSON Schema into Gemini's OpenAPI-subset dialect.
///
/// Type names are upper-cased and `additionalProperties` is dropped, since
/// `responseSchema` rejects it.
pub(crate) fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                match key.as_str() {
                    "additionalProperties" => {}
                    "type" => {
                        let upper = value
                            .as_str()
                            .map(|t| Value::String(t.to_uppercase()))
                            .unwrap_or_else(|| value.clone());
                        out.insert(key.clone(), upper);
                    }
                    "properties" => {
                        let props = value
                            .as_object()
                            .map(|props| {
                                props
                                    .iter()
                                    .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                                    .collect::<Map<_, _>>()
                            })
                            .map(Value::Object)
                            .unwrap_or_else(|| value.clone());
                        out.insert(key.clone(), props);
                    }
                    _ => {
                        out.insert(key.clone(), to_gemini_schema(value));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate_structured(&self, prompt: &str, schema: &ResponseSchema) -> Result<String> {
        let body = Self::build_request(prompt, schema);

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Gemini request failed ({}): {}",
                status, text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to read Gemini response: {}", e)))?;

        // The call completed; an envelope we cannot decode is handed on as-is
        // so the caller reports it as a malformed reply.
        match serde_json::from_str::<GenerateContentResponse>(&body) {
            Ok(parsed) => Ok(Self::extract_text(parsed)),
            Err(e) => {
                tracing::debug!(error = %e, bytes = body.len(), "Undecodable Gemini envelope");
                Ok(body)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
