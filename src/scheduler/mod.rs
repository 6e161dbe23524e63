//! Timing primitives for a claim run
//!
//! # Modules
//!
//! - [`clock`] - Server clock offset from the HTTP `Date` header
//! - [`waiter`] - Drift-corrected, cancellable waits with a final countdown
//! - [`keepalive`] - Background session pings until a cutoff
//!
//! Every blocking call takes the run's `CancellationToken` and returns
//! promptly once it is cancelled.

pub mod clock;
pub mod keepalive;
pub mod waiter;

pub use clock::{ClockOffset, ClockSync};
pub use keepalive::SessionKeeper;
pub use waiter::{sleep_or_cancel, until_cancelled, PrecisionWaiter, WaitOutcome};
