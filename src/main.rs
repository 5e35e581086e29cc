use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chatscribe::auth::{FlowOutcome, LoginFlow};
use chatscribe::browser::BrowserSession;
use chatscribe::chat::Conversation;
use chatscribe::config::{default_config_path, Config};
use chatscribe::console::{until_interrupted, TerminalConsole};
use chatscribe::credentials::Credentials;
use chatscribe::export;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    chatscribe::duration::parse_duration(s).map_err(|e| e.to_string())
}

fn non_blank(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("value must not be blank".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "chatscribe")]
#[command(about = "Log in to the chat site, ask two prompts, and export the replies to CSV")]
struct Cli {
    /// Path to config file.
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Account email.
    #[arg(long, env = "EMAIL", value_parser = non_blank)]
    email: String,

    /// Account password.
    #[arg(long, env = "PASSWORD", hide_env_values = true, value_parser = non_blank)]
    password: String,

    /// First prompt to send after logging in.
    #[arg(long, env = "PROMPT1", value_parser = non_blank)]
    prompt1: String,

    /// Second prompt to send after logging in.
    #[arg(long, env = "PROMPT2", value_parser = non_blank)]
    prompt2: String,

    /// Directory for the exported CSV file.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,

    /// Override how long to wait for each chat reply (e.g. "45s", "2m").
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
    response_timeout: Option<Duration>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(timeout) = self.response_timeout {
            config.timing.response_timeout = timeout;
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    let credentials = Credentials::new(cli.email, cli.password);
    let prompts = vec![cli.prompt1, cli.prompt2];

    let session = BrowserSession::launch(&config.browser).await?;
    let result = until_interrupted(
        run_session(&session, &config, &credentials, &prompts),
        ctrl_c(),
    )
    .await
    .unwrap_or_else(|_| Err(anyhow::anyhow!("Interrupted by Ctrl+C")));

    if let Err(err) = session.close().await {
        error!(error = %err, "Failed to close the browser");
    }
    info!("Browser closed");

    result
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

async fn run_session(
    session: &BrowserSession,
    config: &Config,
    credentials: &Credentials,
    prompts: &[String],
) -> Result<()> {
    let page = session.page();
    let console = TerminalConsole::new();

    match LoginFlow::new(page, &console, config).run(credentials).await {
        FlowOutcome::Authenticated => {}
        FlowOutcome::Failed(err) => {
            anyhow::bail!("{}: {err}", err.tag());
        }
    }

    let exchanges = Conversation::new(page, config)
        .run(prompts)
        .await
        .context("Conversation failed")?;

    export::write_exchanges(&config.output.dir, &exchanges, Utc::now())?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off",
            )
        }))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            1
        }
    };

    // An interrupted verification prompt leaves a blocking stdin read behind,
    // which would keep the runtime from shutting down.
    std::process::exit(code);
}
