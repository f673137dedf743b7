//! Background sweep of stale quota records.
//!
//! # Responsibilities
//! - Periodically remove records whose window expired beyond a grace period
//! - Keep the quota map bounded by active clients instead of every client
//!   identity ever seen

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::quota::QuotaGate;

pub struct QuotaSweeper {
    gate: Arc<QuotaGate>,
    config: RateLimitConfig,
}

impl QuotaSweeper {
    pub fn new(gate: Arc<QuotaGate>, config: RateLimitConfig) -> Self {
        Self { gate, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.sweep_enabled {
            tracing::info!("Quota sweep disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.sweep_interval_secs,
            idle_grace_secs = self.config.idle_grace_secs,
            "Quota sweeper starting"
        );

        let grace = chrono::Duration::seconds(self.config.idle_grace_secs as i64);
        let mut ticker = time::interval(Duration::from_secs(self.config.sweep_interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.gate.prune_expired(Utc::now(), grace);
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            tracked = self.gate.tracked_clients(),
                            "Swept stale quota records"
                        );
                    }
                    metrics::record_quota_clients(self.gate.tracked_clients());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Quota sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
