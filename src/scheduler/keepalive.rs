//! Background session keep-alive
//!
//! Pings the club's tee-time page on a fixed interval until a cutoff instant
//! so the login does not expire while the run waits for the booking window.
//! Best effort only: every failure is logged and absorbed.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::SessionPinger;
use crate::scheduler::waiter::{remaining_until, sleep_or_cancel};

/// Periodic keep-alive task
pub struct SessionKeeper {
    pinger: SessionPinger,
    interval: Duration,
    tick: Duration,
}

impl SessionKeeper {
    pub fn new(pinger: SessionPinger) -> Self {
        Self::with_interval(pinger, Duration::from_secs(60), Duration::from_secs(1))
    }

    /// `tick` bounds how long shutdown can take to be noticed
    pub fn with_interval(pinger: SessionPinger, interval: Duration, tick: Duration) -> Self {
        Self {
            pinger,
            interval,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    /// Start the keeper as an independent task
    pub fn spawn(self, cutoff: DateTime<Utc>, cancel: CancellationToken) -> JoinHandle<u32> {
        tokio::spawn(async move { self.run(cutoff, cancel).await })
    }

    /// Ping until cancelled or `cutoff` is reached; returns the number of
    /// successful pings
    ///
    /// A ping still in flight is abandoned at cancellation or at the cutoff.
    pub async fn run(self, cutoff: DateTime<Utc>, cancel: CancellationToken) -> u32 {
        tracing::info!(url = %self.pinger.url(), "Session keep-alive started");
        let mut pings = 0u32;

        while !cancel.is_cancelled() && Utc::now() < cutoff {
            let ping = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(remaining_until(cutoff)) => break,
                result = self.pinger.ping() => result,
            };
            match ping {
                Ok(status) => {
                    pings += 1;
                    tracing::debug!(status = %status, pings, "Session keep-alive ping");
                }
                Err(e) => tracing::warn!(error = %e, "Session keep-alive ping failed"),
            }

            let started = tokio::time::Instant::now();
            while started.elapsed() < self.interval {
                if cancel.is_cancelled() || Utc::now() >= cutoff {
                    break;
                }
                let step = self
                    .tick
                    .min(self.interval.saturating_sub(started.elapsed()))
                    .min(remaining_until(cutoff));
                if !sleep_or_cancel(step, &cancel).await {
                    break;
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::info!(pings, "Session keep-alive stopped on request");
        } else {
            tracing::info!(pings, "Session keep-alive reached its cutoff");
        }

        pings
    }
}
