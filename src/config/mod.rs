//! Configuration management for teeshot
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files, and turning the `[target]` section into the
//! immutable [`TargetConfig`] a run works from.

pub mod clubs;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::{CategoryFilter, Credentials, SortOrder, TargetConfig, TimeWindow};
use crate::utils::now_kst;

pub use clubs::{club_name, resolve_club, Club, CLUBS};

/// Default service endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.golfzoncounty.com";

/// Browser user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client configuration
    pub client: ClientConfig,

    /// What to claim and when
    pub target: TargetSection,

    /// Waits, retries and pagination limits
    pub timing: TimingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service base URL
    pub base_url: String,

    /// User agent string
    pub user_agent: String,

    /// Verify TLS certificates
    pub tls_verify: bool,

    /// Timeout for login, keep-alive and claim requests in seconds
    pub request_timeout_secs: u64,

    /// Timeout for page loads (login page, clock probe, warm-up) in seconds
    pub page_timeout_secs: u64,
}

/// Raw `[target]` section as written by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSection {
    /// Club name from the club table or a numeric `golfclubSeq`
    pub club: String,

    /// Tee-time date (`YYYYMMDD`); defaults to 30 days from today
    pub claim_date: Option<String>,

    /// Date the booking window opens (`YYYYMMDD`); defaults to today
    pub run_date: Option<String>,

    /// Time the booking window opens (`HH:MM:SS`, KST)
    pub run_time: String,

    /// Earliest acceptable tee time (`HH:MM`)
    pub window_start: String,

    /// Latest acceptable tee time (`HH:MM`)
    pub window_end: String,

    /// Course name, or `ALL`
    pub course: String,

    /// `asc` or `desc`
    pub order: SortOrder,

    /// Delay applied after the target instant, in milliseconds
    pub delay_ms: u64,

    /// Report the best candidate without claiming it
    pub dry_run: bool,
}

/// Waits, retries and pagination limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after login before anything else
    pub settle_delay_ms: u64,

    /// Clock probe attempts
    pub clock_attempts: u32,

    /// Pause between clock probe attempts
    pub clock_retry_pause_ms: u64,

    /// Seconds before the target at which the offset is re-measured and the
    /// countdown starts
    pub refine_lead_secs: u64,

    /// Interval between keep-alive pings
    pub keepalive_interval_secs: u64,

    /// Granularity at which the keep-alive task checks for shutdown
    pub keepalive_tick_ms: u64,

    /// Keep-alive stops this many seconds before the target
    pub keepalive_lead_secs: u64,

    /// Maximum listing pages
    pub listing_pages: u32,

    /// Per-page timeout
    pub listing_timeout_ms: u64,

    /// Attempts per listing page
    pub listing_attempts: u32,

    /// Pages whose trimmed body has fewer characters than this mark the end of data
    pub listing_min_len: usize,

    /// Ranked candidates to try
    pub claim_candidates: usize,

    /// Attempts per candidate
    pub claim_attempts: u32,

    /// Pause between attempts on the same candidate
    pub claim_retry_pause_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            user_agent: String::from(DEFAULT_USER_AGENT),
            tls_verify: true,
            request_timeout_secs: 10,
            page_timeout_secs: 5,
        }
    }
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            club: CLUBS[0].name.to_string(),
            claim_date: None,
            run_date: None,
            run_time: String::from("09:00:00"),
            window_start: String::from("06:00"),
            window_end: String::from("20:00"),
            course: String::from("ALL"),
            order: SortOrder::Asc,
            delay_ms: 0,
            dry_run: true,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            clock_attempts: 5,
            clock_retry_pause_ms: 500,
            refine_lead_secs: 30,
            keepalive_interval_secs: 60,
            keepalive_tick_ms: 1000,
            keepalive_lead_secs: 5,
            listing_pages: 4,
            listing_timeout_ms: 3000,
            listing_attempts: 3,
            listing_min_len: 100,
            claim_candidates: 5,
            claim_attempts: 3,
            claim_retry_pause_ms: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("TEESHOT_BASE_URL") {
            config.client.base_url = base_url;
        }
        if let Some(tls_verify) = env_parse::<bool>("TEESHOT_TLS_VERIFY") {
            config.client.tls_verify = tls_verify;
        }

        if let Ok(club) = std::env::var("TEESHOT_CLUB") {
            config.target.club = club;
        }
        config.target.claim_date = std::env::var("TEESHOT_CLAIM_DATE").ok();
        config.target.run_date = std::env::var("TEESHOT_RUN_DATE").ok();
        if let Ok(run_time) = std::env::var("TEESHOT_RUN_TIME") {
            config.target.run_time = run_time;
        }
        if let Ok(start) = std::env::var("TEESHOT_WINDOW_START") {
            config.target.window_start = start;
        }
        if let Ok(end) = std::env::var("TEESHOT_WINDOW_END") {
            config.target.window_end = end;
        }
        if let Ok(course) = std::env::var("TEESHOT_COURSE") {
            config.target.course = course;
        }
        if let Ok(order) = std::env::var("TEESHOT_ORDER") {
            config.target.order = order
                .parse()
                .with_context(|| format!("Invalid TEESHOT_ORDER: {order}"))?;
        }
        if let Some(delay_ms) = env_parse::<u64>("TEESHOT_DELAY_MS") {
            config.target.delay_ms = delay_ms;
        }
        if let Some(dry_run) = env_parse::<bool>("TEESHOT_DRY_RUN") {
            config.target.dry_run = dry_run;
        }

        if let Ok(level) = std::env::var("TEESHOT_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("TEESHOT_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.client.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.client.base_url))?;

        if self.client.request_timeout_secs == 0 || self.client.page_timeout_secs == 0 {
            anyhow::bail!("request timeouts must be greater than 0");
        }

        let timing = &self.timing;
        if timing.clock_attempts == 0 {
            anyhow::bail!("clock_attempts must be greater than 0");
        }
        if timing.listing_pages == 0 || timing.listing_attempts == 0 {
            anyhow::bail!("listing_pages and listing_attempts must be greater than 0");
        }
        if timing.listing_timeout_ms == 0 {
            anyhow::bail!("listing_timeout_ms must be greater than 0");
        }
        if timing.claim_candidates == 0 || timing.claim_attempts == 0 {
            anyhow::bail!("claim_candidates and claim_attempts must be greater than 0");
        }
        if timing.keepalive_tick_ms == 0 || timing.keepalive_tick_ms > 1000 {
            anyhow::bail!("keepalive_tick_ms must be between 1 and 1000");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Build the immutable run target from the `[target]` section
    pub fn target_config(&self) -> Result<TargetConfig> {
        let section = &self.target;
        let today = now_kst().date_naive();

        let club_seq = resolve_club(&section.club)?;

        let claim_date = match &section.claim_date {
            Some(raw) => parse_date(raw).context("Invalid claim_date")?,
            None => today
                .checked_add_days(Days::new(30))
                .context("claim_date out of range")?,
        };
        let run_date = match &section.run_date {
            Some(raw) => parse_date(raw).context("Invalid run_date")?,
            None => today,
        };
        let run_time = parse_time(&section.run_time).context("Invalid run_time")?;

        Ok(TargetConfig {
            club_seq,
            claim_date,
            run_at: NaiveDateTime::new(run_date, run_time),
            window: TimeWindow::new(&section.window_start, &section.window_end)?,
            category: section.course.parse::<CategoryFilter>()?,
            order: section.order,
            attempt_delay: Duration::from_millis(section.delay_ms),
            dry_run: section.dry_run,
        })
    }
}

/// Read credentials from `TEESHOT_USER_ID` / `TEESHOT_PASSWORD`
pub fn credentials_from_env() -> Option<Credentials> {
    let user_id = std::env::var("TEESHOT_USER_ID").ok()?;
    let password = std::env::var("TEESHOT_PASSWORD").ok()?;
    Some(Credentials::new(user_id, password))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("expected YYYYMMDD, got '{raw}'"))
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("expected HH:MM:SS, got '{raw}'"))
}
