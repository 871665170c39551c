//! telehook CLI entry point.
//!
//! Provides `register`, `invoke`, and `serve` subcommands: one-off webhook
//! registration, a single serverless invocation, and a long-lived webhook
//! host.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, Method};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::info;

use telehook::bot::Bot;
use telehook::config::Config;
use telehook::types::Update;
use telehook::webhook::{self, PollOutcome, ServerlessWebhook};

/// telehook: Telegram webhook adapter for serverless hosts.
#[derive(Parser)]
#[command(name = "telehook", version, about)]
struct Cli {
    /// Config file (default: `$TELEHOOK_CONFIG_PATH` or `./telehook.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Register the configured public URL with Telegram and exit.
    Register,
    /// Handle one webhook request: register, decode, forward, complete.
    Invoke {
        /// File holding the request body. Reads stdin when omitted.
        #[arg(long)]
        body: Option<PathBuf>,
        /// Deadline for the invocation, overriding the config.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Serve the webhook handler on the configured listen address.
    Serve {
        /// Also write rotated JSON logs into this directory.
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal in function hosts.
    let _ = dotenvy::dotenv();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Register => {
            telehook::logging::init_cli();
            handle_register(&config).await
        }
        Command::Invoke { body, timeout_secs } => {
            telehook::logging::init_serverless();
            handle_invoke(&config, body, timeout_secs).await
        }
        Command::Serve { logs_dir } => {
            let _logging_guard = match logs_dir {
                Some(dir) => Some(telehook::logging::init_production(&dir)?),
                None => {
                    telehook::logging::init_cli();
                    None
                }
            };
            handle_serve(&config).await
        }
    }
}

fn build_bot(config: &Config) -> anyhow::Result<Bot> {
    let token = config.bot_token()?;
    Ok(Bot::from_token(&token, &config.telegram.api_base))
}

/// Register the webhook once.
async fn handle_register(config: &Config) -> anyhow::Result<()> {
    let bot = build_bot(config)?;
    let endpoint = config.endpoint()?;
    let result = webhook::register(&bot, endpoint.as_ref())
        .await
        .context("webhook registration failed")?;
    info!(
        url = endpoint.as_ref().map(|e| e.public_url.as_str()),
        description = result.description.as_deref().unwrap_or(""),
        "webhook registered"
    );
    Ok(())
}

/// Run one serverless invocation against a request body.
async fn handle_invoke(
    config: &Config,
    body_path: Option<PathBuf>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let bot = build_bot(config)?;
    let body = read_body(body_path).await?;
    let request = Request::builder()
        .method(Method::POST)
        .uri(config.webhook.path.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .context("failed to build webhook request")?;

    let (tx, mut rx) = mpsc::channel::<Update>(config.webhook.sink_capacity.max(1));
    let consumer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            info!(update = ?update, "update received");
        }
    });

    let mut poller = ServerlessWebhook::new(bot, tx);
    if let Some(endpoint) = config.endpoint()? {
        poller = poller.with_endpoint(endpoint);
    }
    if let Some(listen) = config.webhook.listen.as_deref() {
        poller = poller.with_listen(listen);
    }

    let deadline = timeout_secs
        .or(config.webhook.invoke_timeout_secs)
        .map(Duration::from_secs);
    let report = webhook::invoke(Arc::new(poller), request, deadline).await?;

    // The poller, and with it the sink sender, is gone once invoke returns.
    consumer.await.context("update consumer failed")?;

    if report.outcome != PollOutcome::Forwarded {
        anyhow::bail!(
            "invocation ended without forwarding an update ({:?}, {:?})",
            report.outcome,
            report.completion
        );
    }
    Ok(())
}

/// Serve the reusable handler until Ctrl+C.
async fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let listen = config
        .webhook
        .listen
        .as_deref()
        .context("webhook.listen must be set to serve")?;
    let diagnostics = build_bot(config)?.diagnostics();

    let (tx, mut rx) = mpsc::channel::<Update>(config.webhook.sink_capacity.max(1));
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            info!(update = ?update, "update received");
        }
    });

    let router = webhook::WebhookHandler::new(tx, diagnostics).router(&config.webhook.path);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;

    info!(listen, path = %config.webhook.path, "webhook host listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook host failed")?;
    Ok(())
}

async fn read_body(path: Option<PathBuf>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("failed to read request body from stdin")?;
            Ok(buf)
        }
    }
}
