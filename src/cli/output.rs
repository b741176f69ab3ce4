//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the AutoQualify CLI.

use crate::types::{Interest, QualificationResult};
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the AutoQualify banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}",
                "AutoQualify".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
            println!("   {}\n", "Sales lead qualification server".bright_white());
        } else {
            println!(
                "\n   AutoQualify v{}\n   Sales lead qualification server\n",
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a file creation message
    pub fn created(&self, file_type: &str, path: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                file_type.dimmed(),
                path.bright_white()
            );
        } else {
            println!("  [CREATED] {} {}", file_type, path);
        }
    }

    /// Print a file skipped message
    pub fn skipped(&self, path: &str, reason: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "○".yellow(),
                path.dimmed(),
                format!("({})", reason).yellow()
            );
        } else {
            println!("  [SKIPPED] {} ({})", path, reason);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a subheader
    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// Print completion message with next steps
    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    /// Print the reply a lead would see and the admin insight behind it
    pub fn qualification(&self, result: &QualificationResult) {
        let insight = &result.admin_insight;

        self.subheader("Reply");
        println!("    {}", result.chat_response);

        self.subheader("Admin insight");
        let score = format!("{}/100", insight.score);
        if self.colored {
            let score = match insight.score {
                70..=100 => score.bright_green().bold().to_string(),
                40..=69 => score.yellow().to_string(),
                _ => score.red().to_string(),
            };
            println!("    {}: {}", "score".dimmed(), score);
        } else {
            self.kv("score", &score);
        }

        let interested = if insight.interested == Interest::Yes && self.colored {
            insight.interested.as_str().green().bold().to_string()
        } else {
            insight.interested.as_str().to_string()
        };
        if self.colored {
            println!("    {}: {}", "interested".dimmed(), interested);
        } else {
            self.kv("interested", &interested);
        }

        self.kv("status", insight.status.as_str());
        self.kv("intent", &insight.detected_intent);
        self.kv("reasoning", &insight.reasoning);
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
