/// Resolves once the process is asked to stop, either by Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("ctrl-c handler error: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(not(target_os = "windows"))]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                tracing::info!("register terminate signal handler");
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("signal error: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(target_os = "windows")]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("got ctrl-c"),
        () = terminate => tracing::info!("got terminate signal"),
    }
}
