//! Background task management
//!
//! Periodic maintenance around the engine: sweeping expired lock leases
//! and purging idempotency records past their retention window. Tasks
//! are cancellation-aware for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::fulfillment::manager::FulfillmentManager;

/// How often the lock janitor sweeps expired leases
const LOCK_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// How often expired idempotency records are purged
const IDEMPOTENCY_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Running background tasks
pub struct BackgroundTasks {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    /// Spawn the engine maintenance tasks
    pub fn start(manager: Arc<FulfillmentManager>) -> Self {
        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        {
            let manager = manager.clone();
            let token = shutdown.clone();
            tasks.push((
                "lock_janitor",
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = tokio::time::sleep(LOCK_SWEEP_INTERVAL) => {
                                let swept = manager.locks().sweep_expired();
                                if swept > 0 {
                                    tracing::warn!(swept, "Swept expired lock leases");
                                }
                            }
                        }
                    }
                }),
            ));
        }

        {
            let token = shutdown.clone();
            tasks.push((
                "idempotency_sweep",
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = tokio::time::sleep(IDEMPOTENCY_SWEEP_INTERVAL) => {
                                match manager.purge_expired_idempotency() {
                                    Ok(purged) if purged > 0 => {
                                        tracing::info!(purged, "Purged expired idempotency records");
                                    }
                                    Ok(_) => {}
                                    Err(e) => {
                                        tracing::error!(error = %e, "Idempotency purge failed");
                                    }
                                }
                            }
                        }
                    }
                }),
            ));
        }

        tracing::info!(count = tasks.len(), "Background tasks started");
        Self { tasks, shutdown }
    }

    /// Cancel all tasks and wait for them to finish
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "Background task ended abnormally");
            }
        }
        tracing::info!("Background tasks stopped");
    }
}
