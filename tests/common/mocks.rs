//! Mock implementations for testing.
//!
//! This module provides mock LLM clients and app wiring that can be used
//! across different test files without duplication.

use async_trait::async_trait;
use autoqualify::llm::{LLMClient, ResponseSchema};
use autoqualify::types::{AppError, Result};
use autoqualify::utils::toml_config::{AutoQualifyConfig, AutoQualifyConfigManager, FlowConfig};
use autoqualify::AppState;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Mock LLM client with a fixed reply.
///
/// Records every prompt it receives so tests can check what reached the model.
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given raw reply text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            should_fail: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that replies with `body` serialized as JSON.
    pub fn json(body: Value) -> Self {
        Self::new(body.to_string())
    }

    /// Create a mock client whose call never completes successfully.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_structured(&self, prompt: &str, _schema: &ResponseSchema) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Mock LLM client that holds every call open until [`GatedLLMClient::release`].
pub struct GatedLLMClient {
    response: String,
    started: Notify,
    release: Notify,
}

impl GatedLLMClient {
    pub fn json(body: Value) -> Self {
        Self {
            response: body.to_string(),
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Resolves once a call has reached the model.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Lets one held call (or the next one) complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl LLMClient for GatedLLMClient {
    async fn generate_structured(&self, _prompt: &str, _schema: &ResponseSchema) -> Result<String> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "gated-model"
    }
}

/// A well-formed qualification reply.
pub fn qualification_reply(chat_response: &str, email: &str, score: u64, interested: &str) -> Value {
    json!({
        "chatResponse": chat_response,
        "adminInsight": {
            "sessionId": "echoed-session",
            "userEmail": email,
            "lastMessage": "echoed message",
            "score": score,
            "interested": interested,
            "status": if interested == "YES" { "Pursuable" } else { "Not Pursuable" },
            "detectedIntent": "Pricing inquiry",
            "reasoning": "Asked directly about pricing for a team."
        }
    })
}

/// App state with no artificial delays around the given client.
pub fn test_state(llm: Arc<dyn LLMClient>) -> AppState {
    let config = AutoQualifyConfig {
        flow: FlowConfig::instant(),
        ..AutoQualifyConfig::default()
    };
    AppState::new(Arc::new(AutoQualifyConfigManager::from_config(config)), llm)
}
