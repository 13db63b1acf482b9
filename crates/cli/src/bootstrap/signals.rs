use dnsstress_application::LifecycleController;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Stops the run on the first SIGINT/SIGTERM. Returns without stopping if
/// `done` fires first.
pub async fn stop_on_signal(controller: Arc<LifecycleController>, done: CancellationToken) {
    let Some(name) = first_signal(&done, signal::ctrl_c(), wait_for_sigterm()).await else {
        return;
    };

    info!("caught signal {}, stopping", name);
    controller.stop().await;
}

/// Name of the first signal to arrive, or `None` once `done` fires.
///
/// A SIGINT listener that fails to register is dropped from the race; SIGTERM
/// is still watched.
async fn first_signal(
    done: &CancellationToken,
    interrupt: impl Future<Output = io::Result<()>>,
    terminate: impl Future<Output = ()>,
) -> Option<&'static str> {
    let interrupt = async {
        if let Err(e) = interrupt.await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = done.cancelled() => None,
        _ = interrupt => Some("SIGINT"),
        _ = terminate => Some("SIGTERM"),
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Failed to register SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
