//! HTML parsing and data extraction
//!
//! This module turns the service's markup into structured data: tee-time
//! candidates from the listing fragment and hidden fields from the login
//! page.

pub mod form;
pub mod listing;
pub mod selectors;

pub use form::hidden_fields;
pub use listing::ListingHtmlParser;

use crate::models::Candidate;

/// Turns a raw listing document into candidate records
///
/// Implementations must tolerate malformed fragments: a record that cannot be
/// read is skipped, never aborting the whole parse.
pub trait ListingParser: Send + Sync {
    fn extract_candidates(&self, document: &str) -> Vec<Candidate>;
}
