//! Shutdown signal handling.

use std::time::Duration;

/// Wait for a shutdown signal (Ctrl+C).
pub async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

/// Propagate the shutdown signal to an axum-server handle (the TLS listener
/// does not take a shutdown future directly).
pub fn forward_to_handle(handle: axum_server::Handle) {
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.graceful_shutdown(Some(Duration::from_secs(5)));
    });
}
