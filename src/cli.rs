use crate::config::{load_config, EthosConfig};
use crate::core_engine::CoreEngine;
use crate::ethos_web::build_router;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Top-level CLI interface for QuantaEthos
#[derive(Parser)]
#[command(
    name = "quanta-ethos",
    version,
    about = "Trust-scoring and policy gate in front of a generative model"
)]
pub struct Cli {
    /// Path to a TOML config file (defaults to $ETHOS_CONFIG_PATH, then ./quanta_ethos.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (/ping, /v1/generate, /v1/validate, /v1/status)
    Serve {
        /// Host/IP to bind, overrides server.host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a candidate command and print the decision as JSON
    Validate {
        /// Command text to validate
        command: String,
    },

    /// Run one prompt through the full pipeline and print response, score and decision
    Ask {
        /// Prompt text; read from stdin when omitted
        prompt: Option<String>,
    },
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port),
        Commands::Validate { command } => {
            let output = validate_to_json(&config, &command)?;
            println!("{output}");
            Ok(())
        }
        Commands::Ask { prompt } => {
            let prompt = read_prompt(prompt, std::io::stdin().lock())?;
            let output = ask_to_text(&config, &prompt)?;
            println!("{output}");
            Ok(())
        }
    }
}

pub fn load(path: Option<&Path>) -> anyhow::Result<EthosConfig> {
    load_config(path).context("Failed to load config")
}

/// Run the validator pipeline once and render the decision
pub fn validate_to_json(config: &EthosConfig, command: &str) -> anyhow::Result<String> {
    let engine = CoreEngine::from_config(config);
    let decision = engine.validate_command(command);
    serde_json::to_string_pretty(&decision).context("Failed to render decision")
}

/// The prompt argument, or everything on `input` with the trailing newline dropped
pub fn read_prompt(arg: Option<String>, mut input: impl Read) -> anyhow::Result<String> {
    let prompt = match arg {
        Some(prompt) => prompt,
        None => {
            let mut buf = String::new();
            input
                .read_to_string(&mut buf)
                .context("Failed to read prompt from stdin")?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if prompt.trim().is_empty() {
        bail!("prompt is empty");
    }
    Ok(prompt)
}

/// Run the generate pipeline once and render it for a terminal
pub fn ask_to_text(config: &EthosConfig, prompt: &str) -> anyhow::Result<String> {
    let engine = CoreEngine::from_config(config);
    let generation = engine.generate(prompt).context("Generation failed")?;
    let decision = &generation.decision;
    Ok(format!(
        "[Response]\n{}\n[Trust Score: {:.2}]\n[Decision: {}] {}",
        generation.response, decision.score, decision.outcome, decision.reason
    ))
}

fn serve(config: EthosConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let engine = Arc::new(CoreEngine::from_config(&config));
    let app = build_router(engine);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("HTTP server listening on http://{addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
