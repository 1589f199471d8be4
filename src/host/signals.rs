//! OS signal handling for graceful shutdown

use nbridge_app::BridgeHandle;
use nbridge_core::prelude::*;

/// Spawn a task that shuts the engine down on SIGINT or SIGTERM
pub fn spawn_signal_handler(handle: BridgeHandle) {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!("Signal handler error: {}", e);
            return;
        }

        info!("Shutdown signal received");
        let _ = handle.shutdown().await;
    });
}

/// Wait for a termination signal
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        Ok(())
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbridge_app::inbox;

    #[tokio::test]
    async fn test_signal_handler_spawn() {
        let (handle, mut inbox) = inbox(1);

        spawn_signal_handler(handle);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert!(inbox.try_recv().is_none());
    }
}
