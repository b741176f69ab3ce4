use crate::llm::client::{build_http_client, LLMClient, ResponseSchema};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for OpenAI-compatible `chat/completions` endpoints.
///
/// Structured output uses `response_format: { type: "json_schema", strict: true }`,
/// which keeps the JSON Schema in its standard form.
pub struct OpenAIClient {
    http_client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAIClient {
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

    fn build_request(&self, prompt: &str, schema: &ResponseSchema) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.schema
                }
            }
        })
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_structured(&self, prompt: &str, schema: &ResponseSchema) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt, schema))
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "OpenAI request failed ({}): {}",
                status, text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to read OpenAI response: {}", e)))?;

        let parsed: ChatCompletionResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, bytes = body.len(), "Undecodable OpenAI envelope");
                return Ok(body);
            }
        };

        let Some(choice) = parsed.choices.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(refusal) = choice.message.refusal {
            tracing::debug!(refusal = %refusal, "Model refused structured output");
        }

        Ok(choice.message.content.unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
