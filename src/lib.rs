//! # AutoQualify - Sales Lead Qualification Server
//!
//! A demo server that walks a visitor through a simulated sign-up, login and
//! email verification flow, then either lets them chat with an AI sales agent
//! or shows an admin a live feed of structured insights extracted from those
//! chats.
//!
//! ## Overview
//!
//! AutoQualify can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `autoqualify-server` binary
//! 2. **As a library** - Import components into your own Rust project
//!
//! ### Qualifying a single message
//!
//! ```rust,ignore
//! use autoqualify::{Provider, QualificationClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::Gemini {
//!         api_key: std::env::var("GEMINI_API_KEY")?,
//!         api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
//!         model: "gemini-3-flash-preview".to_string(),
//!         timeout: None,
//!     };
//!
//!     let client = QualificationClient::new(Arc::from(provider.create_client()?));
//!     let result = client
//!         .request_qualification(&[], "What does the enterprise plan cost?", "buyer@corp.com", "demo")
//!         .await?;
//!
//!     println!("{} (score {})", result.chat_response, result.admin_insight.score);
//!     Ok(())
//! }
//! ```
//!
//! ### Configuration-Driven Setup
//!
//! ```rust,ignore
//! use autoqualify::{AppState, AutoQualifyConfigManager};
//! use std::sync::Arc;
//!
//! let config_manager = Arc::new(AutoQualifyConfigManager::new("autoqualify.toml")?);
//! let provider = config_manager.config().resolve_provider()?;
//! let llm = provider.create_client()?;
//! let state = AppState::new(config_manager, Arc::from(llm));
//! let app = autoqualify::api::app(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `swagger-ui` | Serve interactive API docs at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Simulated sign-up, login and email verification
//! - [`feed`] - Admin insight feed with live subscribers
//! - [`llm`] - Hosted model clients (Gemini, OpenAI-compatible)
//! - [`qualify`] - Prompt, response schema and strict reply validation
//! - [`session`] - Visitor sessions and the view-state machine
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration with hot-reload

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Simulated authentication and the session extractor.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Admin insight feed.
pub mod feed;
/// LLM provider clients and abstractions.
pub mod llm;
/// Qualification exchange client.
pub mod qualify;
/// Visitor sessions.
pub mod session;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::SimulatedAuth;
pub use feed::InsightFeed;
pub use llm::{LLMClient, LLMClientFactory, Provider, ResponseSchema};
pub use qualify::{QualificationClient, QualificationError};
pub use session::{Session, SessionStore};
pub use types::{AppError, Result};
pub use utils::toml_config::{AutoQualifyConfig, AutoQualifyConfigManager};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config_manager: Arc<AutoQualifyConfigManager>,
    /// Live visitor sessions
    pub sessions: Arc<SessionStore>,
    /// Qualified leads shared by every admin session
    pub feed: Arc<InsightFeed>,
    /// Calls the hosted model for each chat message
    pub qualifier: Arc<QualificationClient>,
    /// Simulated auth timers
    pub auth: Arc<SimulatedAuth>,
}

impl AppState {
    /// Wires a fresh session store and feed around `llm`.
    pub fn new(config_manager: Arc<AutoQualifyConfigManager>, llm: Arc<dyn LLMClient>) -> Self {
        let capacity = config_manager.config().feed.channel_capacity;
        Self {
            sessions: Arc::new(SessionStore::new()),
            feed: Arc::new(InsightFeed::new(capacity)),
            qualifier: Arc::new(QualificationClient::new(llm)),
            auth: Arc::new(SimulatedAuth::new(config_manager.clone())),
            config_manager,
        }
    }
}
