//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured logs, request IDs)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape of the metrics endpoint
//! ```

pub mod metrics;
