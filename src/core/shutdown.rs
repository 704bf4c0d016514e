use tokio::signal;

/// Resolve once SIGINT or SIGTERM arrives, letting the server drain in-flight
/// exam requests before exiting.
pub(crate) async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                wait_for_interrupt().await;
                tracing::info!("interrupt received, shutting down");
                return;
            }
        };

        tokio::select! {
            _ = wait_for_interrupt() => tracing::info!("interrupt received, shutting down"),
            _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_interrupt().await;
        tracing::info!("interrupt received, shutting down");
    }
}

async fn wait_for_interrupt() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
