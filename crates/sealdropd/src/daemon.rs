//! Daemon lifecycle: storage check, state wiring, systemd notify, HTTP server

use std::net::SocketAddr;

use anyhow::{Context, Result};
use sealdrop_core::config::SealdropConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::server::{self, AppState};

pub async fn run(config: SealdropConfig) -> Result<()> {
    info!("daemon starting");

    // Build storage operator and verify connectivity
    let operator = sealdrop_storage::build_from_core_config(&config.storage)?;
    match sealdrop_storage::check_health(&operator).await {
        Ok(()) => info!(backend = ?config.storage.backend, "storage: connected"),
        Err(e) => warn!(backend = ?config.storage.backend, "storage: {e} (serving anyway)"),
    }

    let state = AppState::build(&config, operator)?;
    if let Some(limiter) = &state.limiter {
        info!(
            window_secs = config.rate_limit.window_secs,
            max_requests = limiter.max_requests(),
            "rate limiting enabled"
        );
    }
    let app = server::router(state);

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("binding {}", config.server.listen))?;
    info!(
        addr = %listener.local_addr()?,
        max_upload_bytes = config.server.max_upload_bytes,
        "http: listening"
    );

    // Send systemd ready notification
    notify_ready();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("http server")?;

    info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ctrl-c handler failed: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn notify_ready() {
    // Uses $NOTIFY_SOCKET; no-op if not set
    if let Ok(socket) = std::env::var("NOTIFY_SOCKET") {
        use std::os::unix::net::UnixDatagram;
        if let Ok(sock) = UnixDatagram::unbound() {
            let _ = sock.send_to(b"READY=1\n", &socket);
            tracing::debug!(notify_socket = %socket, "sent systemd READY=1");
        }
    }
}
