use {
  tokio::signal,
  tracing::{
    info,
    warn
  }
};

/// Resolves once the process is asked to stop.
pub async fn gracefully_shutdown() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      warn!("Shutdown[Warn] Ctrl-C handler unavailable: {e}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use signal::unix::{
      SignalKind,
      signal
    };

    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      },
      Err(e) => {
        warn!("Shutdown[Warn] SIGTERM handler unavailable: {e}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("Shutdown[Info] Received Ctrl-C, shutting down"),
    _ = terminate => info!("Shutdown[Info] Received SIGTERM, shutting down")
  }
}
