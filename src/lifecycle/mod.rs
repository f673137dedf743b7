//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/ctrl-c → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast to subscribers → server drains, sweeper exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
