//! LLM provider clients.
//!
//! Each provider implements [`LLMClient`] by issuing one schema-constrained
//! generation request over HTTP and returning the raw reply text.

/// Provider-agnostic trait, provider selection and client factory.
pub mod client;
/// Google Gemini `generateContent` client.
pub mod gemini;
/// OpenAI-compatible `chat/completions` client.
pub mod openai;

pub use client::{LLMClient, LLMClientFactory, Provider, ResponseSchema};
