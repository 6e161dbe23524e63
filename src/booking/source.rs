//! Paginated tee-time listing fetch
//!
//! The listing endpoint returns an HTML fragment per page. Pages are fetched
//! in order with immediate retries; a page whose trimmed body is below a
//! minimum length means the service ran out of data.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::headers::ACCEPT_HTML;
use crate::client::CountySession;
use crate::config::TimingConfig;
use crate::error::{Error, Result};
use crate::scheduler::until_cancelled;
use crate::utils::error::FetchError;

/// Listing endpoint
pub const LISTING_PATH: &str = "/reserve/golfclub/teetime/getList";

/// Pagination limits for one fetch
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Maximum pages requested
    pub pages: u32,
    /// Timeout for each page request
    pub page_timeout: Duration,
    /// Attempts per page before it is skipped
    pub attempts: u32,
    /// Trimmed body length below which a page marks the end of data
    pub min_len: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            pages: 4,
            page_timeout: Duration::from_millis(3000),
            attempts: 3,
            min_len: 100,
        }
    }
}

impl From<&TimingConfig> for SourceSettings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            pages: timing.listing_pages.max(1),
            page_timeout: Duration::from_millis(timing.listing_timeout_ms),
            attempts: timing.listing_attempts.max(1),
            min_len: timing.listing_min_len,
        }
    }
}

/// Concatenated listing pages in page order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDocument {
    body: String,
    pages: u32,
    skipped: Vec<u32>,
    reached_end: bool,
}

impl ListingDocument {
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Pages that contributed content
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Pages dropped after exhausting their attempts
    pub fn skipped(&self) -> &[u32] {
        &self.skipped
    }

    /// True when a short page ended pagination
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

enum PageResult {
    Content(String),
    End,
    Failed(FetchError),
}

/// Retrieves the raw listing for a club and date
#[derive(Debug, Clone, Default)]
pub struct CandidateSource {
    settings: SourceSettings,
}

impl CandidateSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// Fetch listing pages `1..=pages` for `date` (`YYYYMMDD`)
    ///
    /// A page that keeps failing is skipped so one bad page does not hide
    /// the rest of the listing.
    ///
    /// # Errors
    ///
    /// - `Error::Cancelled` if cancellation is requested, including while a
    ///   page request is in flight
    /// - `Error::Fetch(FetchError::AllPagesFailed)` when no page produced
    ///   content and no end-of-data marker was seen
    pub async fn fetch(
        &self,
        session: &CountySession,
        date: &str,
        cancel: &CancellationToken,
    ) -> Result<ListingDocument> {
        let url = session.endpoint(LISTING_PATH)?;
        let referer = session.teetime_page()?;
        let mut document = ListingDocument::default();

        for page in 1..=self.settings.pages {
            match self
                .fetch_page(session, &url, referer.as_str(), date, page, cancel)
                .await?
            {
                PageResult::Content(body) => {
                    tracing::debug!(page, bytes = body.len(), "Listing page received");
                    document.body.push_str(&body);
                    document.pages += 1;
                }
                PageResult::End => {
                    tracing::info!(page, "Listing ended; no more pages");
                    document.reached_end = true;
                    break;
                }
                PageResult::Failed(e) => {
                    tracing::error!(
                        page,
                        attempts = self.settings.attempts,
                        error = %e,
                        "Listing page failed; skipping it"
                    );
                    document.skipped.push(page);
                }
            }
        }

        if document.pages == 0 && !document.reached_end {
            return Err(FetchError::AllPagesFailed {
                pages: self.settings.pages,
            }
            .into());
        }

        tracing::info!(
            pages = document.pages,
            skipped = document.skipped.len(),
            bytes = document.body.len(),
            "Listing fetched"
        );
        Ok(document)
    }

    async fn fetch_page(
        &self,
        session: &CountySession,
        url: &url::Url,
        referer: &str,
        date: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResult> {
        let page_no = page.to_string();
        let form = [
            ("golfclubSeq", session.club_seq()),
            ("selectDate", date),
            ("selectTimeSection", ""),
            ("selectHoleCnt", ""),
            ("selectPersonCnt", ""),
            ("selectCaddieType", ""),
            ("selectReserveOrderType", ""),
            ("searchFlag", "Y"),
            ("searchTime", ""),
            ("pageNo", page_no.as_str()),
        ];

        let mut last_error = FetchError::MaxRetriesExceeded;
        for attempt in 1..=self.settings.attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let headers = session.headers(Some(referer), ACCEPT_HTML);
            let request =
                session.post_form(url.clone(), headers, &form, self.settings.page_timeout);
            let Some(result) = until_cancelled(request, cancel).await else {
                return Err(Error::Cancelled);
            };
            let reply = match result {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(page, attempt, error = %e, "Listing request failed");
                    last_error = e;
                    continue;
                }
            };

            if !reply.is_html() {
                tracing::warn!(
                    page,
                    attempt,
                    content_type = %reply.content_type,
                    "Listing page was not HTML"
                );
                last_error = FetchError::UnexpectedContentType(reply.content_type);
                continue;
            }

            if reply.body.trim().chars().count() < self.settings.min_len {
                return Ok(PageResult::End);
            }

            return Ok(PageResult::Content(reply.body));
        }

        Ok(PageResult::Failed(last_error))
    }
}
