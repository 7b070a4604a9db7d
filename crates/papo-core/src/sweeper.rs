use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::presence::{PresenceRegistry, SweepReport};

#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Time between the start of two passes.
    pub interval: Duration,
    /// Idle time after which a participant is evicted.
    pub ttl: TimeDelta,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            ttl: TimeDelta::seconds(10),
        }
    }
}

/// Background task that evicts idle participants.
///
/// Each pass is awaited before the next tick is taken and missed ticks are
/// skipped, so two passes never run at once. Returns when `shutdown` fires.
pub async fn run_sweep_loop(
    registry: Arc<PresenceRegistry>,
    config: SweepConfig,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Sweeper started (every {:?}, ttl {}s)",
        config.interval,
        config.ttl.num_seconds()
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        sweep_once(registry.clone(), config.ttl).await;
    }

    info!("Sweeper stopped");
}

/// One eviction pass at the registry clock's current time.
pub async fn sweep_once(registry: Arc<PresenceRegistry>, ttl: TimeDelta) -> SweepReport {
    // The store is synchronous; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || {
        let now = registry.now();
        registry.evict_stale(now, ttl)
    })
    .await;

    match result {
        Ok(Ok(report)) => {
            if !report.evicted.is_empty() {
                info!("Sweep: evicted {} participant(s)", report.evicted.len());
            }
            if !report.failed.is_empty() {
                warn!("Sweep: {} eviction(s) will be retried", report.failed.len());
            }
            debug!(evicted = report.evicted.len(), failed = report.failed.len(), "Sweep finished");
            report
        }
        Ok(Err(e)) => {
            warn!("Sweep skipped: {}", e);
            SweepReport::default()
        }
        Err(e) => {
            error!("Sweep task join error: {}", e);
            SweepReport::default()
        }
    }
}
