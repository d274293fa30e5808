use anyhow::{Context, Result};
use blockview_config::BlockviewConfig;
use blockview_provider::{ProviderServer, SnapshotProvider, SqliteStore};
use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "blockview-provider",
    version,
    about = "Serves the latest blockchain metrics snapshot over HTTP"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "BLOCKVIEW_CONFIG", default_value = "blockview.toml", value_name = "PATH")]
    config: PathBuf,

    /// Overrides the SQLite database path.
    #[arg(long, env = "BLOCKVIEW_DB_PATH", value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Overrides the bind address.
    #[arg(long, env = "BLOCKVIEW_BIND", value_name = "ADDR")]
    bind: Option<IpAddr>,

    /// Overrides the HTTP port.
    #[arg(long, env = "BLOCKVIEW_PORT", value_name = "PORT")]
    port: Option<u16>,

    /// Overrides the number of pooled database connections.
    #[arg(long, env = "BLOCKVIEW_MAX_CONNECTIONS", value_name = "N")]
    max_connections: Option<usize>,

    /// Disables the permissive CORS layer.
    #[arg(long)]
    no_cors: bool,

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

    if let Some(path) = cli.db_path {
        config.store.path = path;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(max_connections) = cli.max_connections {
        config.store.max_connections = max_connections;
    }
    if cli.no_cors {
        config.server.cors_enabled = false;
    }
    config.validate()?;

    let store = SqliteStore::open(&config.store)?;
    store
        .ensure_schema()
        .await
        .context("creating snapshot table")?;
    info!(
        target: "blockview",
        path = %store.path().display(),
        pool_size = store.pool_size(),
        "datastore ready"
    );

    let provider = SnapshotProvider::new(Arc::new(store));
    let server = ProviderServer::bind(&config.server, provider)
        .await
        .with_context(|| format!("binding {}", config.server.listen_address()))?;

    server
        .run(async {
            match signal::ctrl_c().await {
                Ok(()) => info!(target: "blockview", "shutdown signal received (Ctrl+C)"),
                Err(err) => error!(target: "blockview", error = %err, "failed to wait for shutdown signal"),
            }
        })
        .await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,blockview=info"));
    let builder = fmt().with_env_filter(env_filter);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
