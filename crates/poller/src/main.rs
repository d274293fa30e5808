use anyhow::{Context, Result};
use blockview_config::BlockviewConfig;
use blockview_poller::{render, SnapshotPoller};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "blockview-watch",
    version,
    about = "Polls a blockview provider and prints the latest snapshot"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "BLOCKVIEW_CONFIG", default_value = "blockview.toml", value_name = "PATH")]
    config: PathBuf,

    /// Overrides the provider base URL.
    #[arg(long, env = "BLOCKVIEW_ENDPOINT", value_name = "URL")]
    endpoint: Option<String>,

    /// Overrides the polling interval in milliseconds.
    #[arg(long, env = "BLOCKVIEW_INTERVAL_MS", value_name = "MS")]
    interval_ms: Option<u64>,

    /// Overrides the per-fetch timeout in milliseconds.
    #[arg(long, env = "BLOCKVIEW_TIMEOUT_MS", value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log output format.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = BlockviewConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(endpoint) = cli.endpoint {
        config.poller.endpoint = endpoint;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poller.interval_ms = interval_ms;
    }
    if cli.timeout_ms.is_some() {
        config.poller.timeout_ms = cli.timeout_ms;
    }
    config.poller.validate()?;

    let poller = SnapshotPoller::from_config(&config.poller)
        .with_context(|| format!("invalid endpoint {}", config.poller.endpoint))?;
    info!(
        target: "blockview",
        endpoint = %config.poller.endpoint,
        timeout_ms = poller.fetch_timeout().as_millis() as u64,
        "watching provider"
    );

    let handle = poller.start(config.poller.interval(), |state| {
        println!("{}", render(state));
    });

    match signal::ctrl_c().await {
        Ok(()) => info!(target: "blockview", "shutdown signal received (Ctrl+C)"),
        Err(err) => error!(target: "blockview", error = %err, "failed to wait for shutdown signal"),
    }
    handle.stop();

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,blockview=info"));
    let builder = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
