//! Candidate filtering and ordering

use crate::models::{Candidate, CategoryFilter, SortOrder, TimeWindow};

/// Number of candidates a claim run works through
pub const DEFAULT_SHORTLIST: usize = 5;

/// Filtered, ordered candidates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    ordered: Vec<Candidate>,
    shortlist_len: usize,
}

impl Ranking {
    /// All matching candidates in preference order
    pub fn ordered(&self) -> &[Candidate] {
        &self.ordered
    }

    /// The first few candidates, the ones a claim run tries
    pub fn shortlist(&self) -> &[Candidate] {
        &self.ordered[..self.ordered.len().min(self.shortlist_len)]
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.ordered.first()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Orders candidates by preference
#[derive(Debug, Clone)]
pub struct Ranker {
    shortlist_len: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_SHORTLIST)
    }
}

impl Ranker {
    pub fn new(shortlist_len: usize) -> Self {
        Self {
            shortlist_len: shortlist_len.max(1),
        }
    }

    /// Keep candidates inside `window` whose course passes `category`, then
    /// sort by `(time, course_code)` in `order`
    ///
    /// The sort is stable in both directions: candidates with identical keys
    /// keep their listing order.
    pub fn rank(
        &self,
        candidates: Vec<Candidate>,
        window: &TimeWindow,
        category: &CategoryFilter,
        order: SortOrder,
    ) -> Ranking {
        let total = candidates.len();
        let mut ordered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| window.contains(&c.time) && category.matches(&c.course_name))
            .collect();

        if order.is_descending() {
            ordered.sort_by(|a, b| (&b.time, &b.course_code).cmp(&(&a.time, &a.course_code)));
        } else {
            ordered.sort_by(|a, b| (&a.time, &a.course_code).cmp(&(&b.time, &b.course_code)));
        }

        tracing::info!(
            total,
            matching = ordered.len(),
            window = %window,
            course = %category,
            order = %order,
            "Candidates ranked"
        );
        for (rank, candidate) in ordered.iter().take(self.shortlist_len).enumerate() {
            tracing::info!(
                rank = rank + 1,
                candidate = %candidate,
                slot_id = %candidate.slot_id,
                "Shortlisted"
            );
        }

        Ranking {
            ordered,
            shortlist_len: self.shortlist_len,
        }
    }
}
