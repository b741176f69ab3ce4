//! TOML-based configuration for AutoQualify
//!
//! All settings live in one file (`autoqualify.toml` by default). Secrets are
//! never written to it: the provider section names the environment variable
//! holding the API key, which is resolved once at startup.
//!
//! # Hot Reloading
//!
//! Flow timings and chat settings are read through [`AutoQualifyConfigManager`]
//! on every use, so edits to the file apply without a restart. The LLM client
//! is built at startup and keeps its original provider settings.

use crate::llm::Provider;
use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from autoqualify.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoQualifyConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted model used for qualification
    pub provider: ProviderConfig,

    /// Simulated auth/verification timings
    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Sessions untouched for this long are dropped by the idle sweep
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_secs() -> u64 {
    1800
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        /// Environment variable containing the API key
        #[serde(default = "default_gemini_key_env")]
        api_key_env: String,
        #[serde(default = "default_gemini_base")]
        api_base: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        /// Request timeout; unset leaves it to the transport
        timeout_secs: Option<u64>,
    },
    OpenAI {
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        model: String,
        timeout_secs: Option<u64>,
    },
}

fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Gemini {
            api_key_env: default_gemini_key_env(),
            api_base: default_gemini_base(),
            model: default_gemini_model(),
            timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    pub fn api_key_env(&self) -> &str {
        match self {
            ProviderConfig::Gemini { api_key_env, .. } | ProviderConfig::OpenAI { api_key_env, .. } => {
                api_key_env
            }
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Gemini { model, .. } | ProviderConfig::OpenAI { model, .. } => model,
        }
    }

    pub fn api_base(&self) -> &str {
        match self {
            ProviderConfig::Gemini { api_base, .. } | ProviderConfig::OpenAI { api_base, .. } => {
                api_base
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Gemini { .. } => "gemini",
            ProviderConfig::OpenAI { .. } => "openai",
        }
    }
}

// ============= Flow Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Artificial latency of a sign-up or login submit
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,

    /// Artificial latency of the "I've verified" check
    #[serde(default = "default_verify_delay_ms")]
    pub verify_delay_ms: u64,

    #[serde(default = "default_resend_cooldown_secs")]
    pub resend_cooldown_secs: u64,

    /// How long the "link dispatched" acknowledgment stays visible
    #[serde(default = "default_resend_ack_secs")]
    pub resend_ack_secs: u64,
}

fn default_submit_delay_ms() -> u64 {
    1200
}

fn default_verify_delay_ms() -> u64 {
    2000
}

fn default_resend_cooldown_secs() -> u64 {
    60
}

fn default_resend_ack_secs() -> u64 {
    5
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: default_submit_delay_ms(),
            verify_delay_ms: default_verify_delay_ms(),
            resend_cooldown_secs: default_resend_cooldown_secs(),
            resend_ack_secs: default_resend_ack_secs(),
        }
    }
}

impl FlowConfig {
    /// No artificial delays; used by tests and the CLI.
    pub fn instant() -> Self {
        Self {
            submit_delay_ms: 0,
            verify_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_secs)
    }

    pub fn resend_ack(&self) -> Duration {
        Duration::from_secs(self.resend_ack_secs)
    }
}

// ============= Chat Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// First agent message of every user dashboard visit
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Most recent messages sent as context; unset sends the whole conversation
    pub history_window: Option<usize>,
}

fn default_greeting() -> String {
    "Hi! Welcome to AutoQualify. How can I help you today?".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            history_window: None,
        }
    }
}

// ============= Feed Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Results buffered per live subscriber before it starts skipping
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    crate::feed::DEFAULT_CHANNEL_CAPACITY
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl AutoQualifyConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Parse without validating; environment variables are not consulted.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate internal consistency and that the API key variable is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_values()?;
        self.validate_env_var(self.provider.api_key_env())
    }

    /// The checks that do not depend on the environment.
    pub fn validate_values(&self) -> Result<(), ConfigError> {
        if self.provider.model().trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.model must not be empty".to_string(),
            ));
        }

        let base = self.provider.api_base();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "provider.api_base must be an http(s) URL, got '{}'",
                base
            )));
        }

        if self.chat.greeting.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "chat.greeting must not be empty".to_string(),
            ));
        }

        if self.chat.history_window == Some(0) {
            return Err(ConfigError::ValidationError(
                "chat.history_window must be at least 1 when set".to_string(),
            ));
        }

        if self.server.session_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "server.session_ttl_secs must be at least 1".to_string(),
            ));
        }

        if self.feed.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "feed.channel_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Whether the provider's API key variable is present in the environment
    pub fn api_key_present(&self) -> bool {
        std::env::var(self.provider.api_key_env()).is_ok()
    }

    /// Resolve the provider section into a ready-to-use [`Provider`],
    /// reading the API key from the environment.
    pub fn resolve_provider(&self) -> Result<Provider, ConfigError> {
        let api_key_env = self.provider.api_key_env();
        let api_key = std::env::var(api_key_env)
            .map_err(|_| ConfigError::MissingEnvVar(api_key_env.to_string()))?;

        Ok(match &self.provider {
            ProviderConfig::Gemini {
                api_base,
                model,
                timeout_secs,
                ..
            } => Provider::Gemini {
                api_key,
                api_base: api_base.clone(),
                model: model.clone(),
                timeout: timeout_secs.map(Duration::from_secs),
            },
            ProviderConfig::OpenAI {
                api_base,
                model,
                timeout_secs,
                ..
            } => Provider::OpenAI {
                api_key,
                api_base: api_base.clone(),
                model: model.clone(),
                timeout: timeout_secs.map(Duration::from_secs),
            },
        })
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct AutoQualifyConfigManager {
    config: Arc<ArcSwap<AutoQualifyConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl AutoQualifyConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = AutoQualifyConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config (useful for testing).
    /// This won't have file watching capabilities.
    pub fn from_config(config: AutoQualifyConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("autoqualify.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<AutoQualifyConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = AutoQualifyConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Editors often replace the file, so watch the parent directory
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        tokio::spawn(async move {
            let mut last_reload = std::time::Instant::now();
            let debounce_duration = Duration::from_millis(500);

            while rx.recv().await.is_some() {
                if last_reload.elapsed() < debounce_duration {
                    continue;
                }

                // Let the write finish
                tokio::time::sleep(Duration::from_millis(100)).await;

                match AutoQualifyConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = std::time::Instant::now();
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}
