//! CLI module for AutoQualify
//!
//! Provides command-line interface parsing and handling for the autoqualify-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// AutoQualify - Sales Lead Qualification Server
///
/// Chat with leads through a hosted model and surface the promising ones
/// to admins as they qualify.
#[derive(Parser, Debug)]
#[command(
    name = "autoqualify-server",
    version,
    about = "AutoQualify - Sales Lead Qualification Server",
    long_about = "A demo server that qualifies sales leads from chat messages using a hosted\n\
                  generative model and streams the resulting insights to admins.\n\n\
                  Run without arguments to start the server, or use 'init' to write a starter config.",
    after_help = "EXAMPLES:\n    \
                  autoqualify-server init                       # Write autoqualify.toml\n    \
                  autoqualify-server init --provider openai     # Use an OpenAI-compatible endpoint\n    \
                  autoqualify-server                            # Start the server\n    \
                  autoqualify-server qualify --email a@b.co \"What does it cost?\""
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "autoqualify.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Hosted model family written by `init`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Openai,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Write a starter configuration
    ///
    /// Creates autoqualify.toml and .env.example in the target directory.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Hosted model provider to configure
        #[arg(long, value_enum, default_value_t = ProviderKind::Gemini)]
        provider: ProviderKind,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file, including the API key variable
        #[arg(long)]
        validate: bool,
    },

    /// Qualify one message against the configured provider and print the result
    Qualify {
        /// Email of the lead sending the message
        #[arg(long)]
        email: String,

        /// The lead's message
        message: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
