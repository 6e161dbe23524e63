//! Precision waiting toward a wall-clock instant
//!
//! Sleeps are always recomputed against the wall clock, never accumulated, so
//! a long countdown does not drift. The last couple of milliseconds before a
//! boundary are spent yielding instead of sleeping, because timer wheels
//! round sleeps up to the next millisecond tick.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::utils::format_clock;

/// Remaining time below which a wait returns immediately
const IMMEDIATE: Duration = Duration::from_millis(1);

/// Final window spent yielding rather than sleeping
const SPIN_WINDOW: Duration = Duration::from_millis(2);

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Target reached; `drift` is how late (positive) the wait returned
    Reached { drift: ChronoDuration },
    /// Cancellation was requested before the target
    Cancelled,
}

impl WaitOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Waits until an instant with a staged countdown
#[derive(Debug, Clone)]
pub struct PrecisionWaiter {
    countdown_threshold: Duration,
}

impl Default for PrecisionWaiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl PrecisionWaiter {
    /// `countdown_threshold` is how long before the target the per-second
    /// countdown starts
    pub fn new(countdown_threshold: Duration) -> Self {
        Self {
            countdown_threshold,
        }
    }

    /// Suspend until `target`
    ///
    /// Without `countdown` this is one coarse suspend. With `countdown`, a
    /// long wait first sleeps until the threshold, then counts down second by
    /// second, each step sleeping to the exact boundary `target − (N−1)s`.
    /// Cancellation interrupts any suspension immediately.
    pub async fn wait_until(
        &self,
        target: DateTime<Utc>,
        cancel: &CancellationToken,
        countdown: bool,
    ) -> WaitOutcome {
        if cancel.is_cancelled() {
            return WaitOutcome::Cancelled;
        }

        let remaining = remaining_until(target);
        tracing::info!(target = %format_clock(target), "Waiting for target time (KST)");

        if remaining <= IMMEDIATE {
            tracing::warn!("Target time already reached; continuing immediately");
            return reached(target);
        }

        if !countdown {
            if !approach(target, cancel).await {
                return cancelled();
            }
            return reached(target);
        }

        if remaining > self.countdown_threshold {
            tracing::info!(
                remaining_secs = remaining.as_secs_f64(),
                countdown_from_secs = self.countdown_threshold.as_secs(),
                "Sleeping until countdown starts"
            );
            let head = target
                - ChronoDuration::from_std(self.countdown_threshold)
                    .unwrap_or_else(|_| ChronoDuration::zero());
            if !approach(head, cancel).await {
                return cancelled();
            }
        }

        let start = remaining_until(target).as_secs();
        for seconds_left in (1..=start).rev() {
            if cancel.is_cancelled() {
                return cancelled();
            }

            tracing::info!(seconds_left, "Countdown");

            let boundary = target - ChronoDuration::seconds((seconds_left - 1) as i64);
            if !approach(boundary, cancel).await {
                return cancelled();
            }
        }

        if !approach(target, cancel).await {
            return cancelled();
        }

        reached(target)
    }
}

/// Time left until `target`, zero when already past
pub fn remaining_until(target: DateTime<Utc>) -> Duration {
    (target - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}

/// Sleep for `duration` unless cancelled first; returns false on cancellation
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Drive `future` unless cancelled first; `None` on cancellation
///
/// The future is dropped on cancellation, aborting any request in flight.
pub async fn until_cancelled<F>(future: F, cancel: &CancellationToken) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = future => Some(output),
    }
}

/// Reach `target` on the wall clock; returns false on cancellation
async fn approach(target: DateTime<Utc>, cancel: &CancellationToken) -> bool {
    loop {
        let remaining = remaining_until(target);
        if remaining.is_zero() {
            return true;
        }

        if remaining <= SPIN_WINDOW {
            while Utc::now() < target {
                if cancel.is_cancelled() {
                    return false;
                }
                tokio::task::yield_now().await;
            }
            return true;
        }

        if !sleep_or_cancel(remaining - SPIN_WINDOW, cancel).await {
            return false;
        }
    }
}

fn reached(target: DateTime<Utc>) -> WaitOutcome {
    let drift = Utc::now() - target;
    tracing::info!(
        drift_ms = drift.num_microseconds().unwrap_or_default() as f64 / 1000.0,
        "Target time reached"
    );
    WaitOutcome::Reached { drift }
}

fn cancelled() -> WaitOutcome {
    tracing::warn!("Stop requested while waiting");
    WaitOutcome::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_past_target_returns_immediately() {
        let waiter = PrecisionWaiter::default();
        let cancel = CancellationToken::new();
        let target = Utc::now() - ChronoDuration::seconds(3);

        let outcome = waiter.wait_until(target, &cancel, true).await;
        assert!(matches!(outcome, WaitOutcome::Reached { .. }));
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let waiter = PrecisionWaiter::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let target = Utc::now() + ChronoDuration::seconds(60);
        assert!(waiter.wait_until(target, &cancel, false).await.is_cancelled());
    }

    #[tokio::test]
    async fn test_sleep_or_cancel() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(Duration::from_millis(5), &cancel).await);
        cancel.cancel();
        assert!(!sleep_or_cancel(Duration::from_secs(60), &cancel).await);
    }

    #[tokio::test]
    async fn test_until_cancelled_drops_pending_future() {
        let cancel = CancellationToken::new();
        assert_eq!(until_cancelled(async { 7 }, &cancel).await, Some(7));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let started = std::time::Instant::now();
        let stalled = until_cancelled(tokio::time::sleep(Duration::from_secs(30)), &cancel).await;
        assert!(stalled.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_remaining_until_past_is_zero() {
        assert_eq!(
            remaining_until(Utc::now() - ChronoDuration::seconds(1)),
            Duration::ZERO
        );
    }
}
