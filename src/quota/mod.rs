//! Per-client request quota subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → identity.rs (derive client identity from peer addr / forwarded header)
//!     → gate.rs (admit or reject against the client's window)
//!     → rejected requests answered with 429 + reset time
//!
//! Background:
//!     sweep.rs removes records whose window expired long ago
//! ```
//!
//! # Design Decisions
//! - Fixed window with lazy rollover: no timer per client, the window
//!   resets on the first check after expiry
//! - Rejection is a normal outcome carrying the reset instant, not an error
//! - Quota state is owned exclusively by the gate; nothing else reads or
//!   mutates it

pub mod gate;
pub mod identity;
pub mod sweep;

pub use gate::{Decision, QuotaGate};
pub use identity::IdentityResolver;
pub use sweep::QuotaSweeper;
