//! The quota gate: admit-or-reject decisions per client.
//!
//! # Responsibilities
//! - Track request counts per client identity over a fixed window
//! - Reset windows lazily on the first check after expiry
//! - Report the exact reset instant on rejection
//!
//! # Design Decisions
//! - DashMap entry access keeps the read-check-increment sequence atomic
//!   per client, so two concurrent requests can never both slip under the
//!   limit when only one slot remains
//! - Wall-clock timestamps (not `Instant`) so the reset instant can be
//!   reported to clients and injected in tests

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Per-client counter plus window expiry.
#[derive(Debug, Clone)]
struct ClientRecord {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed to the upstream proxy.
    Admitted,
    /// The client is over its limit until `reset_at`.
    Rejected { reset_at: DateTime<Utc> },
}

/// Tracks request counts per client identity over a rolling fixed window.
pub struct QuotaGate {
    records: DashMap<String, ClientRecord>,
    max_requests: u32,
    window: Duration,
}

impl QuotaGate {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            records: DashMap::new(),
            max_requests: config.max_requests,
            window: Duration::seconds(config.window_secs as i64),
        }
    }

    /// Check whether a request from `client_id` at `now` is admitted.
    ///
    /// First request from a client creates its record with count 1. An
    /// expired window is reset in place (lazy rollover). Under the limit
    /// the count is incremented; otherwise the stored reset instant is
    /// returned verbatim so the caller can compute retry timing.
    pub fn check(&self, client_id: &str, now: DateTime<Utc>) -> Decision {
        // The entry guard holds the shard lock for this key, making the
        // whole read-check-increment sequence atomic per client.
        let mut record = self
            .records
            .entry(client_id.to_string())
            .or_insert_with(|| ClientRecord {
                count: 0,
                reset_at: now + self.window,
            });

        if now > record.reset_at {
            record.count = 1;
            record.reset_at = now + self.window;
            return Decision::Admitted;
        }

        if record.count < self.max_requests {
            record.count += 1;
            Decision::Admitted
        } else {
            Decision::Rejected {
                reset_at: record.reset_at,
            }
        }
    }

    /// Remove records whose window expired more than `grace` ago.
    ///
    /// Correctness never depends on this: rollover is lazy. The sweep only
    /// bounds memory growth against the number of distinct clients seen.
    pub fn prune_expired(&self, now: DateTime<Utc>, grace: Duration) -> usize {
        // Counted per dropped record: handlers insert concurrently, so a
        // before/after length difference is not a removal count.
        let removed = AtomicUsize::new(0);
        self.records.retain(|_, record| {
            let keep = now <= record.reset_at + grace;
            if !keep {
                removed.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });
        removed.into_inner()
    }

    /// Number of client records currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }
}
