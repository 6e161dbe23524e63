//! Server clock offset estimation
//!
//! The booking window opens on the service's clock, not ours. The offset is
//! read from the HTTP `Date` header of a cheap page load.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::headers::{with_content_type, ACCEPT_HTML};
use crate::client::CountySession;
use crate::error::{Error, Result};
use crate::scheduler::waiter::until_cancelled;
use crate::utils::{format_clock, kst};

/// Page probed for the `Date` header
pub const CLOCK_PROBE_PATH: &str = "/login";

/// Measured difference between the service clock and the local clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOffset {
    /// `remote − local`
    offset: ChronoDuration,
    /// True when no measurement succeeded and the offset is assumed zero
    degraded: bool,
}

impl ClockOffset {
    pub fn new(offset: ChronoDuration) -> Self {
        Self {
            offset,
            degraded: false,
        }
    }

    /// Zero offset flagged as unmeasured
    pub fn degraded() -> Self {
        Self {
            offset: ChronoDuration::zero(),
            degraded: true,
        }
    }

    pub fn offset(&self) -> ChronoDuration {
        self.offset
    }

    pub fn seconds(&self) -> f64 {
        self.offset.num_milliseconds() as f64 / 1000.0
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Local instant at which the service clock shows `remote`
    pub fn to_local(&self, remote: DateTime<Utc>) -> DateTime<Utc> {
        remote - self.offset
    }

    /// Current instant on the service clock, in KST
    pub fn corrected_now(&self) -> DateTime<FixedOffset> {
        (Utc::now() + self.offset).with_timezone(&kst())
    }
}

impl Default for ClockOffset {
    fn default() -> Self {
        Self::new(ChronoDuration::zero())
    }
}

/// Offset from a `Date` header value sampled at `local`
pub fn offset_from_date_header(header: &str, local: DateTime<Utc>) -> Option<ChronoDuration> {
    let remote = DateTime::parse_from_rfc2822(header.trim()).ok()?;
    Some(remote.with_timezone(&Utc) - local)
}

/// Measures the offset with bounded retries
#[derive(Debug, Clone)]
pub struct ClockSync {
    attempts: u32,
    retry_pause: Duration,
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500))
    }
}

impl ClockSync {
    pub fn new(attempts: u32, retry_pause: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            retry_pause,
        }
    }

    /// Measure `remote − local`
    ///
    /// Transport failures, error statuses and missing or unreadable `Date`
    /// headers are retried. When every attempt fails the offset is zero and
    /// flagged degraded; the run continues without skew correction.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if cancellation is requested while measuring.
    pub async fn measure(
        &self,
        session: &CountySession,
        cancel: &CancellationToken,
    ) -> Result<ClockOffset> {
        let url = session.endpoint(CLOCK_PROBE_PATH)?;
        tracing::info!("Checking server time");

        for attempt in 1..=self.attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let headers = with_content_type(session.headers(None, ACCEPT_HTML), "text/html");
            let request = session.get(url.clone(), headers, session.page_timeout());
            let Some(result) = until_cancelled(request, cancel).await else {
                return Err(Error::Cancelled);
            };
            match result {
                Ok(reply) => {
                    let local = Utc::now();
                    match reply
                        .date
                        .as_deref()
                        .and_then(|date| offset_from_date_header(date, local))
                    {
                        Some(offset) => {
                            let measured = ClockOffset::new(offset);
                            tracing::info!(
                                server = %format_clock(local + offset),
                                local = %format_clock(local),
                                offset_secs = measured.seconds(),
                                "Server time measured"
                            );
                            return Ok(measured);
                        }
                        None => tracing::warn!(
                            attempt,
                            max_attempts = self.attempts,
                            date = ?reply.date,
                            "Server response carried no usable Date header"
                        ),
                    }
                }
                Err(e) => tracing::warn!(
                    attempt,
                    max_attempts = self.attempts,
                    error = %e,
                    "Server time request failed"
                ),
            }

            if attempt < self.attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(self.retry_pause) => {}
                }
            }
        }

        tracing::error!("Server time check failed; continuing without offset correction");
        Ok(ClockOffset::degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_offset_from_date_header() {
        let local = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let offset = offset_from_date_header("Sun, 18 Oct 2026 00:00:02 GMT", local).unwrap();
        assert_eq!(offset, ChronoDuration::seconds(2));

        let behind = offset_from_date_header("Sat, 17 Oct 2026 23:59:59 GMT", local).unwrap();
        assert_eq!(behind, ChronoDuration::seconds(-1));
    }

    #[test]
    fn test_bad_date_header() {
        let local = Utc::now();
        assert!(offset_from_date_header("yesterday-ish", local).is_none());
        assert!(offset_from_date_header("", local).is_none());
    }

    #[test]
    fn test_to_local_subtracts_offset() {
        let remote = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let ahead = ClockOffset::new(ChronoDuration::milliseconds(1500));
        assert_eq!(
            ahead.to_local(remote),
            remote - ChronoDuration::milliseconds(1500)
        );
        assert!((ahead.seconds() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degraded_is_zero() {
        let offset = ClockOffset::degraded();
        assert!(offset.is_degraded());
        assert_eq!(offset.offset(), ChronoDuration::zero());
        assert!(!ClockOffset::default().is_degraded());
    }
}
