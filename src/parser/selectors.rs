//! CSS selectors and attribute names for the reservation service's markup

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    /// Bookable tee-time rows; unavailable rows carry no confirm handler
    static ref LISTING_ITEM: Selector = parse_selector!("li[onclick*='teetimeReserveConfirm']");

    static ref INFO_BLOCK: Selector = parse_selector!("div.info");

    static ref INFO_LABEL: Selector = parse_selector!("span");

    static ref HIDDEN_INPUT: Selector = parse_selector!("input[type='hidden']");
}

/// Booking time attribute (`1735`)
pub const ATTR_BOOKING_TIME: &str = "data-bookg-time";

/// Time-table id attribute (`12094331`)
pub const ATTR_SLOT_ID: &str = "data-time-table-id";

/// Course code attribute (`B`)
pub const ATTR_COURSE_CODE: &str = "data-course-cd-code";

/// Course name used when the info block has no label
pub const UNKNOWN_COURSE: &str = "알수없음";

/// Selectors for the tee-time listing fragment
pub struct ListingSelectors {
    pub item: &'static Selector,
    pub info: &'static Selector,
    pub label: &'static Selector,
}

impl ListingSelectors {
    pub fn new() -> Self {
        Self {
            item: &LISTING_ITEM,
            info: &INFO_BLOCK,
            label: &INFO_LABEL,
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Selector for hidden form fields on the login page
pub fn hidden_input() -> &'static Selector {
    &HIDDEN_INPUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_listing_item_requires_confirm_handler() {
        let html = Html::parse_fragment(
            r#"<ul>
                <li onclick="teetimeReserveConfirm(this)">open</li>
                <li onclick="alert('closed')">closed</li>
                <li>plain</li>
            </ul>"#,
        );
        let selectors = ListingSelectors::new();
        assert_eq!(html.select(selectors.item).count(), 1);
    }

    #[test]
    fn test_hidden_input_selector() {
        let html = Html::parse_document(
            r#"<form><input type="hidden" name="csrf" value="x"><input type="text" name="userId"></form>"#,
        );
        assert_eq!(html.select(hidden_input()).count(), 1);
    }
}
