use anyhow::{Context, Result};
use std::io::ErrorKind;
use storage_node::{
    config::AppConfig, routes::routes, services::storage_service::FileStorage, state::AppState,
};
use tokio::{net::TcpListener, signal, sync::oneshot};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;
    tracing::info!("Starting storage-node with config: {:?}", cfg);

    // --- Initialize core service (creates storage + metadata directories) ---
    let storage = FileStorage::new(&cfg.storage_path)
        .await
        .with_context(|| format!("initializing storage at {}", cfg.storage_path.display()))?;

    // --- Build router ---
    let state = AppState::new(storage, cfg.instance_id.clone());
    let app = routes::app(state, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err).with_context(|| format!("binding {}", addr)),
    };

    let local_addr = listener.local_addr()?;
    tracing::info!(instance_id = %cfg.instance_id, "Server listening on http://{}", local_addr);
    tracing::info!("Storage path: {}", cfg.storage_path.display());
    tracing::info!("File API: http://{}/api/v1/files", local_addr);

    // The server future keeps running until drained; the grace period starts
    // when the signal fires.
    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        res = &mut server => res?,
        _ = signalled_rx => {
            tracing::info!(
                "Shutting down, waiting up to {:?} for in-flight requests",
                cfg.shutdown_timeout
            );
            match tokio::time::timeout(cfg.shutdown_timeout, &mut server).await {
                Ok(res) => res?,
                Err(_) => tracing::warn!("Graceful shutdown timed out, forcing exit"),
            }
        }
    }

    tracing::info!("Server exited");
    Ok(())
}

/// Resolve on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
