//! Init command implementation
//!
//! Writes a starter `autoqualify.toml` and `.env.example`.

use super::output::Output;
use super::ProviderKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// autoqualify.toml already exists and `--force` was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Hosted model provider to configure
    pub provider: ProviderKind,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing AutoQualify");

    let base_path = &config.path;
    if let Err(e) = fs::create_dir_all(base_path) {
        output.error(&format!("Failed to create {}: {}", base_path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let config_path = base_path.join("autoqualify.toml");
    if config_path.exists() && !config.force {
        output.warning("autoqualify.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating configuration files");

    if let Err(e) = write_file(&config_path, &generate_config_toml(config.provider), true) {
        output.error(&format!("Failed to create autoqualify.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "autoqualify.toml");

    let env_path = base_path.join(".env.example");
    match write_file(&env_path, &generate_env_example(config.provider), config.force) {
        Ok(true) => output.created("env", ".env.example"),
        Ok(false) => output.skipped(".env.example", "already exists"),
        Err(e) => {
            output.error(&format!("Failed to create .env.example: {}", e));
            return InitResult::Error(e.to_string());
        }
    }

    output.complete("AutoQualify initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set your API key:");
    output.command("cp .env.example .env");
    output.command(&format!("# Edit .env and set {}", api_key_env(config.provider)));
    output.newline();
    output.info("2. Start the server:");
    output.command("autoqualify-server");
    output.hint("API docs available at /swagger-ui/ (requires 'swagger-ui' feature)");

    InitResult::Success
}

/// Writes `content` unless the file exists and `force` is off. Returns whether it wrote.
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn api_key_env(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::Openai => "OPENAI_API_KEY",
    }
}

fn generate_config_toml(provider: ProviderKind) -> String {
    let provider_section = match provider {
        ProviderKind::Gemini => {
            r#"[provider]
type = "gemini"
api_key_env = "GEMINI_API_KEY"
api_base = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-3-flash-preview"
# timeout_secs = 30"#
        }
        ProviderKind::Openai => {
            r#"[provider]
type = "openai"
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
model = "gpt-4o-mini"
# timeout_secs = 30"#
        }
    };

    format!(
        r#"# AutoQualify configuration
# The API key itself never goes here; set it in the environment or .env.

[server]
host = "127.0.0.1"
port = 3000
log_level = "info"
# Idle sessions are dropped after this many seconds
session_ttl_secs = 1800

{provider_section}

# Simulated auth and verification timings
[flow]
submit_delay_ms = 1200
verify_delay_ms = 2000
resend_cooldown_secs = 60
resend_ack_secs = 5

[chat]
greeting = "Hi! Welcome to AutoQualify. How can I help you today?"
# Only send the most recent messages as context
# history_window = 20

[feed]
channel_capacity = 256
"#
    )
}

fn generate_env_example(provider: ProviderKind) -> String {
    format!(
        r#"# AutoQualify Environment Variables
# Copy this file to .env and fill in the values.

# REQUIRED: API key for the hosted model
{}=

# Optional: Logging level (trace, debug, info, warn, error)
RUST_LOG=info,autoqualify=debug
"#,
        api_key_env(provider)
    )
}
