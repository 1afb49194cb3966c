//! sealdropd: sealdrop encrypted file relay
//!
//! Usage:
//!   sealdropd [--config /etc/sealdrop/config.toml] [--port 3000]
//!
//! Endpoints:
//!   POST /upload                               - multipart `file` → key, iv, authTag, hash
//!   GET  /download/{id}?key=&iv=&authTag=      - decrypted bytes
//!   GET  /metrics, /healthz, /readyz           - operational probes

mod daemon;
mod error;
mod headers;
mod metrics;
mod rate_limit;
mod server;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use sealdrop_core::config::ServerConfig;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sealdropd", version, about = "sealdrop encrypted file relay")]
struct Cli {
    /// Path to sealdrop.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "SEALDROP_CONFIG",
        default_value = "/etc/sealdrop/config.toml"
    )]
    config: PathBuf,

    /// Listen address, overrides server.listen
    #[arg(long, env = "SEALDROP_LISTEN")]
    listen: Option<String>,

    /// Listen port, overrides the port of the listen address
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error), overrides server.log_level
    #[arg(long, env = "SEALDROP_LOG")]
    log: Option<String>,

    /// Log format (json, text), overrides server.log_format
    #[arg(long, env = "SEALDROP_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let mut config = sealdrop_core::config::load_or_default(&cli.config)?;
    let (level, format) = resolve_logging(&cli, &config.server)?;
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        config_found,
        "sealdropd starting"
    );

    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(port) = cli.port {
        config.server.listen = with_port(&config.server.listen, port);
    }

    daemon::run(config).await
}

/// Command-line flag first, then the `[server]` section.
fn resolve_logging(cli: &Cli, server: &ServerConfig) -> Result<(String, LogFormat)> {
    let level = cli.log.clone().unwrap_or_else(|| server.log_level.clone());
    let format = match &cli.log_format {
        Some(format) => format.clone(),
        None => LogFormat::from_str(&server.log_format, true)
            .map_err(|e| anyhow!("invalid server.log_format {:?}: {e}", server.log_format))?,
    };
    Ok((level, format))
}

/// Replace the port of a listen address, keeping the host part.
fn with_port(listen: &str, port: u16) -> String {
    if let Ok(addr) = listen.parse::<SocketAddr>() {
        return SocketAddr::new(addr.ip(), port).to_string();
    }
    // Bare IP, including unbracketed or bracketed IPv6 without a port
    let bare = listen.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return SocketAddr::new(ip, port).to_string();
    }
    let host = listen
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(listen);
    format!("{host}:{port}")
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
