//! LLM client abstractions and provider selection
//!
//! The qualification flow needs exactly one thing from a hosted model: a reply
//! whose text is constrained to a JSON schema. Providers implement that single
//! operation behind [`LLMClient`]:
//! - **Gemini**: `generateContent` with `responseMimeType` + `responseSchema`
//! - **OpenAI-compatible**: `chat/completions` with a strict `json_schema` response format

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
///
/// Implementations return the raw reply text. Parsing and validating it is the
/// caller's job, so a client only fails when the call itself did not complete.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion whose text must conform to `schema`
    async fn generate_structured(&self, prompt: &str, schema: &ResponseSchema) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// A named JSON Schema describing the reply a model must produce.
///
/// The schema is kept in plain JSON Schema form (lowercase type names);
/// providers translate it to their own dialect when building a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Clone)]
pub enum Provider {
    /// Google Gemini `generateContent` API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: std::env::var("GEMINI_API_KEY")?,
    ///     api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-3-flash-preview".to_string(),
    ///     timeout: None,
    /// };
    /// ```
    Gemini {
        api_key: String,
        api_base: String,
        model: String,
        timeout: Option<Duration>,
    },

    /// Any endpoint speaking the OpenAI `chat/completions` protocol
    /// (OpenAI, OpenRouter, Ollama's `/v1`, vLLM, ...)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        timeout: Option<Duration>,
    },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Gemini {
                api_key,
                api_base,
                model,
                timeout,
            } => Ok(Box::new(super::gemini::GeminiClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *timeout,
            )?)),
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                timeout,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *timeout,
            )?)),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::OpenAI { .. } => "OpenAI",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini { model, .. } | Provider::OpenAI { model, .. } => model,
        }
    }
}

// The API key must never end up in logs.
impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (api_base, model, timeout) = match self {
            Provider::Gemini {
                api_base,
                model,
                timeout,
                ..
            }
            | Provider::OpenAI {
                api_base,
                model,
                timeout,
                ..
            } => (api_base, model, timeout),
        };
        f.debug_struct(self.name())
            .field("api_key", &"***")
            .field("api_base", api_base)
            .field("model", model)
            .field("timeout", timeout)
            .finish()
    }
}

/// Builds the shared reqwest client used by every provider.
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))
}

/// Configuration-based client factory
///
/// # Example
///
/// ```rust,ignore
/// use autoqualify::llm::{LLMClientFactory, Provider};
///
/// let factory = LLMClientFactory::new(provider);
/// let client = factory.create_default()?;
/// ```
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified default provider
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }

    /// Create a client using the default provider
    pub fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client()
    }

    /// Get a reference to the default provider
    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}
