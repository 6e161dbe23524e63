//! Claiming a tee time
//!
//! # Modules
//!
//! - [`source`] - Paginated listing fetch
//! - [`ranker`] - Window and course filtering, preference ordering
//! - [`claim`] - Two-phase reservation attempt
//! - [`orchestrator`] - The end-to-end run

pub mod claim;
pub mod orchestrator;
pub mod ranker;
pub mod source;

pub use claim::{classify_failure, ClaimAttempt, FailureClass};
pub use orchestrator::{Orchestrator, RunOutcome, RunSettings, RunStep};
pub use ranker::{Ranker, Ranking};
pub use source::{CandidateSource, ListingDocument, SourceSettings};
