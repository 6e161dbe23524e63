//! Tee-time listing parser
//!
//! The listing endpoint answers with an HTML fragment of `<li>` rows. Every
//! bookable row carries its reservation metadata in `data-*` attributes and
//! its course label inside `div.info`.

use scraper::{ElementRef, Html};

use crate::models::Candidate;
use crate::parser::selectors::{
    ListingSelectors, ATTR_BOOKING_TIME, ATTR_COURSE_CODE, ATTR_SLOT_ID, UNKNOWN_COURSE,
};
use crate::parser::ListingParser;
use crate::utils::error::ParseError;

/// scraper-based [`ListingParser`]
pub struct ListingHtmlParser {
    selectors: ListingSelectors,
}

impl ListingHtmlParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: ListingSelectors::new(),
        }
    }

    /// Extract one candidate from a listing row
    ///
    /// # Errors
    /// Returns `ParseError::MissingAttribute` when a `data-*` attribute is
    /// absent, `ParseError::MissingElement` when the row has no `div.info`,
    /// and `ParseError::InvalidTime` for a malformed booking time.
    pub fn parse_item(&self, item: ElementRef<'_>) -> Result<Candidate, ParseError> {
        let attr = |name: &'static str| {
            item.value()
                .attr(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or(ParseError::MissingAttribute(name))
        };

        let time = attr(ATTR_BOOKING_TIME)?;
        let slot_id = attr(ATTR_SLOT_ID)?;
        let course_code = attr(ATTR_COURSE_CODE)?;

        let info = item
            .select(self.selectors.info)
            .next()
            .ok_or(ParseError::MissingElement("div.info"))?;
        let course_name = info
            .select(self.selectors.label)
            .next()
            .map(|span| span.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| UNKNOWN_COURSE.to_string());

        Candidate::new(time, slot_id, course_code, course_name)
    }
}

impl Default for ListingHtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingParser for ListingHtmlParser {
    fn extract_candidates(&self, document: &str) -> Vec<Candidate> {
        let html = Html::parse_fragment(document);
        let mut candidates = Vec::new();
        let mut skipped = 0usize;

        for item in html.select(self.selectors.item) {
            match self.parse_item(item) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(error = %e, "Skipping malformed listing row");
                }
            }
        }

        tracing::debug!(
            found = candidates.len(),
            skipped,
            "Parsed tee-time listing"
        );

        candidates
    }
}
