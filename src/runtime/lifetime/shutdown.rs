use tokio::signal;
use tracing::{error, info, warn};

use crate::storage::KeyStore;

/// Resolve on SIGINT or SIGTERM (Ctrl+C only on non-unix targets).
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        let mut terminate = match unix_signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "Failed to create SIGTERM handler: {}. Only Ctrl+C will stop the server.",
                    e
                );
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = terminate.recv() => {
                info!("SIGTERM received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("SIGINT received, shutting down..."),
        Err(e) => {
            // must not resolve, or the server stops at boot
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Write the in-memory collection to disk before exit.
pub fn flush_store(store: &KeyStore) {
    match store.flush() {
        Ok(()) => info!(
            "Flushed {} keys to {}",
            store.len(),
            store.path().display()
        ),
        Err(e) => error!("Failed to flush keys on shutdown: {}", e),
    }
}
