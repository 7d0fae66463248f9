//! In-process report worker.

use platform_authz::PolicyEngine;
use platform_db::{DbPool, reports};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Handle for queueing reports onto the worker.
#[derive(Clone, Debug)]
pub struct ReportQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl ReportQueue {
    pub fn enqueue(&self, report_id: Uuid) {
        if self.tx.send(report_id).is_err() {
            warn!(%report_id, "report worker stopped; report stays pending");
        }
    }

    /// A queue with no worker behind it; reports stay PENDING.
    #[cfg(test)]
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

/// Start the worker. Reports a previous run left GENERATING are failed and
/// PENDING ones are requeued.
pub async fn spawn_worker(pool: DbPool, engine: PolicyEngine) -> ReportQueue {
    let (tx, mut rx) = mpsc::unbounded_channel::<Uuid>();
    let queue = ReportQueue { tx };

    if let Err(err) = reports::fail_interrupted(&pool).await {
        error!(error = %err, "failed to close interrupted reports");
    }
    match reports::pending_reports(&pool).await {
        Ok(pending) => {
            if !pending.is_empty() {
                info!(count = pending.len(), "requeueing pending reports");
            }
            for report_id in pending {
                queue.enqueue(report_id);
            }
        }
        Err(err) => error!(error = %err, "failed to list pending reports"),
    }

    tokio::spawn(async move {
        info!("report worker started");
        while let Some(report_id) = rx.recv().await {
            match reports::run_report(&pool, &engine, report_id).await {
                Ok(report) => info!(%report_id, status = ?report.status, "report finished"),
                Err(err) => error!(%report_id, error = %err, "report could not be processed"),
            }
        }
        info!("report worker stopped");
    });

    queue
}
