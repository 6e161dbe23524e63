//! Core data structures for a claim run
//!
//! Everything here is immutable once a run starts: the target description,
//! the credentials, the candidates produced from the listing and the outcome
//! of each claim attempt.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
use crate::utils::error::ParseError;
use crate::utils::{kst, to_api_time, to_display_time};

/// Login identifier and secret
///
/// Held only in memory for the authentication step.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty before a run may start
    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Course filter applied by the ranker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CategoryFilter {
    /// No filtering ("ALL")
    #[default]
    Any,
    /// Only candidates whose course name equals this label
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, course_name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => name == course_name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::config("course filter cannot be empty"));
        }
        if trimmed.eq_ignore_ascii_case("all") {
            Ok(Self::Any)
        } else {
            Ok(Self::Named(trimmed.to_string()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ALL"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Ranking direction by time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Earliest tee time first
    #[default]
    Asc,
    /// Latest tee time first
    Desc,
}

impl SortOrder {
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Desc)
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "순차" => Ok(Self::Asc),
            "desc" | "descending" | "역순" => Ok(Self::Desc),
            other => Err(Error::config(format!(
                "invalid order '{other}', expected 'asc' or 'desc'"
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Inclusive time-of-day window in canonical `HHMM` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    start: String,
    end: String,
}

impl TimeWindow {
    /// Build a window from `HH:MM` or `HHMM` bounds
    pub fn new(start: &str, end: &str) -> Result<Self, Error> {
        let start = to_api_time(start)
            .ok_or_else(|| Error::config(format!("invalid window start '{start}'")))?;
        let end =
            to_api_time(end).ok_or_else(|| Error::config(format!("invalid window end '{end}'")))?;
        if start > end {
            return Err(Error::config(format!(
                "window start {start} is after window end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn contains(&self, time: &str) -> bool {
        self.start.as_str() <= time && time <= self.end.as_str()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{}",
            to_display_time(&self.start),
            to_display_time(&self.end)
        )
    }
}

/// Everything one run needs to know about what to claim and when
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Club sequence code (`golfclubSeq`)
    pub club_seq: String,
    /// Date of the tee time to claim
    pub claim_date: NaiveDate,
    /// Instant the booking window opens, as KST wall-clock time
    pub run_at: NaiveDateTime,
    pub window: TimeWindow,
    pub category: CategoryFilter,
    pub order: SortOrder,
    /// Fixed delay between reaching the target and fetching the listing
    pub attempt_delay: Duration,
    /// Report the top candidate without claiming it
    pub dry_run: bool,
}

impl TargetConfig {
    /// The run instant on the service's clock, as UTC
    pub fn run_instant(&self) -> DateTime<Utc> {
        kst()
            .from_local_datetime(&self.run_at)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&self.run_at))
    }

    /// Claim date in the service's `YYYYMMDD` form
    pub fn claim_date_param(&self) -> String {
        self.claim_date.format("%Y%m%d").to_string()
    }
}

/// One available tee time from the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Canonical `HHMM` time of day
    pub time: String,
    /// Time-table id used by both claim phases
    pub slot_id: String,
    /// Course code (`A`, `B`, ...)
    pub course_code: String,
    /// Course display name (`OUT`, `IN`, ...)
    pub course_name: String,
}

impl Candidate {
    /// Build a candidate, canonicalizing the booking time
    pub fn new(
        time: &str,
        slot_id: impl Into<String>,
        course_code: impl Into<String>,
        course_name: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let time = to_api_time(time).ok_or_else(|| ParseError::InvalidTime(time.to_string()))?;
        Ok(Self {
            time,
            slot_id: slot_id.into(),
            course_code: course_code.into(),
            course_name: course_name.into(),
        })
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", to_display_time(&self.time), self.course_name)
    }
}

/// Reservation identifiers returned by a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// `bookgInfoId`
    pub reservation_id: String,
    /// `bookgNo`
    pub reservation_no: String,
}

/// Result of one claim attempt against one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub success: bool,
    pub message: String,
    pub confirmation: Option<Confirmation>,
}

impl AttemptOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            confirmation: None,
        }
    }

    pub fn booked(confirmation: Confirmation) -> Self {
        Self {
            success: true,
            message: format!("reservation complete (no. {})", confirmation.reservation_no),
            confirmation: Some(confirmation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("golfer", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("golfer"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::Any);
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::Any);
        assert_eq!(
            "IN".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Named("IN".into())
        );
        assert!(" ".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_time_window_inclusive() {
        let window = TimeWindow::new("06:00", "20:00").unwrap();
        assert!(window.contains("0600"));
        assert!(window.contains("2000"));
        assert!(!window.contains("2001"));
        assert!(!window.contains("0559"));
        assert_eq!(window.to_string(), "06:00~20:00");
    }

    #[test]
    fn test_time_window_rejects_inverted() {
        assert!(TimeWindow::new("20:00", "06:00").is_err());
        assert!(TimeWindow::new("xx", "06:00").is_err());
    }

    #[test]
    fn test_run_instant_is_kst() {
        let target = TargetConfig {
            club_seq: "1".into(),
            claim_date: NaiveDate::from_ymd_opt(2026, 11, 17).unwrap(),
            run_at: NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            window: TimeWindow::new("06:00", "20:00").unwrap(),
            category: CategoryFilter::Any,
            order: SortOrder::Asc,
            attempt_delay: Duration::ZERO,
            dry_run: true,
        };
        assert_eq!(
            target.run_instant(),
            Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
        );
        assert_eq!(target.claim_date_param(), "20261117");
    }

    #[test]
    fn test_candidate_canonical_time() {
        let candidate = Candidate::new("730", "12094331", "A", "OUT").unwrap();
        assert_eq!(candidate.time, "0730");
        assert_eq!(candidate.to_string(), "07:30 (OUT)");
        assert_eq!(
            Candidate::new("", "1", "A", "OUT"),
            Err(ParseError::InvalidTime(String::new()))
        );
    }
}
