use anyhow::{bail, Context};
use autoqualify::{
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    utils::toml_config::{AutoQualifyConfig, AutoQualifyConfigManager},
    AppState, LLMClientFactory, QualificationClient,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
        }) => match init::run(
            InitConfig {
                path,
                force,
                provider,
            },
            &output,
        ) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => bail!("init failed: {}", e),
        },
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, &output),
        Some(Commands::Qualify { email, message }) => {
            qualify_once(&cli.config, cli.verbose, &email, &message, &output).await
        }
        Some(Commands::Serve) | None => serve(&cli.config, cli.verbose, &output).await,
    }
}

fn init_tracing(log_level: &str, verbose: bool) {
    let default_directive = if verbose {
        "autoqualify=debug,autoqualify_server=debug,tower_http=debug".to_string()
    } else {
        format!("autoqualify={0},autoqualify_server={0},tower_http=info", log_level)
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_manager(path: &Path, output: &Output) -> anyhow::Result<AutoQualifyConfigManager> {
    AutoQualifyConfigManager::new(path).map_err(|e| {
        output.error(&e.to_string());
        output.hint("Run 'autoqualify-server init' to create a configuration file");
        anyhow::Error::new(e).context(format!("loading {}", path.display()))
    })
}

async fn serve(config_path: &Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    let config_manager = Arc::new(load_manager(config_path, output)?);
    let config = config_manager.config();

    init_tracing(&config.server.log_level, verbose);
    output.banner();

    let factory = LLMClientFactory::new(config.resolve_provider()?);
    tracing::info!(
        provider = factory.default_provider().name(),
        model = factory.default_provider().model(),
        "Qualification provider configured"
    );
    let llm = factory.create_default()?;

    if let Err(e) = config_manager.start_watching() {
        tracing::warn!("Config hot-reload disabled: {}", e);
    }

    let state = AppState::new(config_manager.clone(), Arc::from(llm));
    let cleanup = state.sessions.start_cleanup_task(config.server.session_ttl());
    let app = autoqualify::api::app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("AutoQualify listening on http://{}", addr);
    output.success(&format!("Server running at http://{}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cleanup.abort();
    config_manager.stop_watching();
    Ok(())
}

fn show_config(config_path: &Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    if !config_path.exists() {
        output.error(&format!("{} not found", config_path.display()));
        output.hint("Run 'autoqualify-server init' to create a configuration file");
        bail!("configuration file not found");
    }

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config = AutoQualifyConfig::parse(&content)?;

    output.header(&format!("Configuration ({})", config_path.display()));

    output.subheader("Server");
    output.kv("host", &config.server.host);
    output.kv("port", &config.server.port.to_string());
    output.kv("log_level", &config.server.log_level);
    output.kv("session_ttl_secs", &config.server.session_ttl_secs.to_string());

    output.subheader("Provider");
    output.kv("type", config.provider.kind());
    output.kv("model", config.provider.model());
    output.kv("api_base", config.provider.api_base());
    let key_state = if config.api_key_present() {
        "set"
    } else {
        "not set"
    };
    output.kv(
        "api_key",
        &format!("${} ({})", config.provider.api_key_env(), key_state),
    );

    output.subheader("Flow");
    output.kv("submit_delay_ms", &config.flow.submit_delay_ms.to_string());
    output.kv("verify_delay_ms", &config.flow.verify_delay_ms.to_string());
    output.kv("resend_cooldown_secs", &config.flow.resend_cooldown_secs.to_string());
    output.kv("resend_ack_secs", &config.flow.resend_ack_secs.to_string());

    output.subheader("Chat");
    output.kv("greeting", &config.chat.greeting);
    output.kv(
        "history_window",
        &config
            .chat
            .history_window
            .map_or_else(|| "all".to_string(), |n| n.to_string()),
    );

    output.subheader("Feed");
    output.kv("channel_capacity", &config.feed.channel_capacity.to_string());

    if validate {
        output.newline();
        match config.validate() {
            Ok(()) => output.success("Configuration is valid"),
            Err(e) => {
                output.error(&e.to_string());
                bail!("configuration is invalid");
            }
        }
    }

    Ok(())
}

async fn qualify_once(
    config_path: &Path,
    verbose: bool,
    email: &str,
    message: &str,
    output: &Output,
) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        bail!("message must not be empty");
    }

    let config = load_manager(config_path, output)?.config();
    if verbose {
        init_tracing("debug", true);
    }

    let factory = LLMClientFactory::new(config.resolve_provider()?);
    let client = QualificationClient::new(Arc::from(factory.create_default()?));
    let session_id = format!("cli-{}", uuid::Uuid::new_v4());

    output.info(&format!(
        "Qualifying with {} ({})",
        factory.default_provider().name(),
        client.model_name()
    ));
    let result = client
        .request_qualification(&[], message, email, &session_id)
        .await?;

    output.qualification(&result);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
