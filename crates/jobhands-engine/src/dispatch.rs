//! Dispatch loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::EngineShared;
use crate::metrics::FireEventKind;

/// Run until `cancel` fires.
///
/// Each pass takes due triggers off the table under one write lock, hands the
/// fires to the worker pool, then sleeps until the nearest fire time, a table
/// mutation or cancellation.
pub(crate) async fn run_dispatch_loop(shared: Arc<EngineShared>, cancel: CancellationToken) {
    info!("Scheduler dispatch loop started");
    shared.metrics.mark_start();

    loop {
        let now = shared.clock.now();
        let batch = shared
            .table
            .write()
            .take_due(now, shared.config.misfire_threshold());

        for firing in batch.firings {
            shared.workers.submit(firing);
        }
        for retired in batch.retired {
            shared.metrics.record_retired();
            shared
                .events
                .record(&retired.job_key, Some(&retired.trigger_key), FireEventKind::Retired);
            debug!(
                job_key = %retired.job_key,
                trigger_key = %retired.trigger_key,
                job_removed = retired.job_removed,
                "Trigger retired"
            );
        }

        let wait = shared.table.read().next_wakeup().map_or(shared.config.idle_wait(), |at| {
            (at - shared.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(shared.config.idle_wait())
        });

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.wakeup.notified() => {}
            _ = tokio::time::sleep(wait) => {}
        }
    }

    info!("Scheduler dispatch loop stopped");
}
