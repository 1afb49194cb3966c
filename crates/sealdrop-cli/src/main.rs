//! sealdrop: client for the sealdrop encrypted file relay
//!
//! Commands:
//!   upload <path>                                 - send a file, print its receipt (key, iv, authTag)
//!   download <id> <key> <iv> <auth_tag> <output>  - fetch and decrypt a stored file
//!   config show                                   - display current configuration
//!
//! The relay never keeps the key. Lose the receipt and the file is gone.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{multipart, Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sealdrop",
    version,
    about = "sealdrop encrypted file relay client",
    long_about = "sealdrop: upload files to a sealdrop relay and download them with their one-time key"
)]
struct Cli {
    /// Path to sealdrop.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "SEALDROP_CONFIG",
        default_value = "/etc/sealdrop/config.toml"
    )]
    config: PathBuf,

    /// Relay base URL
    #[arg(
        long,
        short = 's',
        env = "SEALDROP_SERVER",
        default_value = "http://localhost:3000"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a file; the relay encrypts it and returns the key material
    Upload {
        /// Local file to upload
        path: PathBuf,
    },

    /// Download and decrypt a file using the key material from its receipt
    Download {
        /// Object identifier (`filename` in the upload receipt)
        id: String,
        /// Key, 64 hex chars
        key: String,
        /// IV, 24 hex chars
        iv: String,
        /// Authentication tag, 32 hex chars
        auth_tag: String,
        /// Where to write the plaintext
        output: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

/// Upload response body, as returned by the relay
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadReceipt {
    message: String,
    filename: String,
    hash: String,
    key: String,
    iv: String,
    auth_tag: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Upload { path } => cmd_upload(&http_client()?, &cli.server, &path).await,
        Commands::Download {
            id,
            key,
            iv,
            auth_tag,
            output,
        } => {
            let url = download_url(&cli.server, &id, &key, &iv, &auth_tag)?;
            cmd_download(&http_client()?, url, &id, &output).await
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&cli.config),
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("sealdrop/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}

// ── URL building ──────────────────────────────────────────────────────────────

/// Append path segments to the relay base URL, keeping any base path.
fn endpoint(server: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(server).with_context(|| format!("invalid server URL: {server}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("server URL cannot be a base: {server}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn download_url(server: &str, id: &str, key: &str, iv: &str, auth_tag: &str) -> Result<Url> {
    let mut url = endpoint(server, &["download", id])?;
    url.query_pairs_mut()
        .append_pair("key", key)
        .append_pair("iv", iv)
        .append_pair("authTag", auth_tag);
    Ok(url)
}

/// Turn a non-2xx relay response into an error carrying the relay's message.
async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    bail!("relay returned {status}: {message}")
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── `sealdrop upload` ─────────────────────────────────────────────────────────

async fn cmd_upload(client: &Client, server: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("not a file: {}", path.display());
    }
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let size = data.len() as u64;

    let url = endpoint(server, &["upload"])?;
    tracing::debug!(url = %url, size, "uploading");

    let pb = make_spinner("upload");
    pb.set_message(format!("{name} ({})", fmt_bytes(size)));

    let form = multipart::Form::new().part("file", multipart::Part::bytes(data).file_name(name));
    let result = async {
        let resp = client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        ensure_success(resp)
            .await?
            .json::<UploadReceipt>()
            .await
            .context("decoding upload receipt")
    }
    .await;

    let receipt = match result {
        Ok(receipt) => {
            pb.finish_with_message("done");
            receipt
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e);
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&receipt).context("rendering receipt")?
    );
    eprintln!("Keep key, iv and authTag: the relay does not store them.");
    Ok(())
}

// ── `sealdrop download` ───────────────────────────────────────────────────────

async fn cmd_download(client: &Client, url: Url, id: &str, output: &Path) -> Result<()> {
    tracing::debug!(id, "downloading");

    let pb = make_spinner("download");
    pb.set_message(id.to_string());

    let result = async {
        let resp = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET download/{id}"))?;
        ensure_success(resp)
            .await?
            .bytes()
            .await
            .context("reading response body")
    }
    .await;

    let body = match result {
        Ok(body) => {
            pb.finish_with_message("done");
            body
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e);
        }
    };

    tokio::fs::write(output, &body)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Downloaded {id} → {} ({})",
        output.display(),
        fmt_bytes(body.len() as u64)
    );
    Ok(())
}

// ── `sealdrop config show` ────────────────────────────────────────────────────

fn cmd_config_show(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    print!("{}", render_config(config_path)?);
    Ok(())
}

fn render_config(config_path: &Path) -> Result<String> {
    let mut config = sealdrop_core::config::load_or_default(config_path)
        .with_context(|| format!("loading config: {}", config_path.display()))?;
    if config.storage.secret_access_key.is_some() {
        config.storage.secret_access_key = Some("***".to_string());
    }
    toml::to_string_pretty(&config).context("serializing config to TOML")
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
