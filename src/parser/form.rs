//! Login page form parsing

use scraper::Html;

use crate::parser::selectors::hidden_input;

/// Collect `name`/`value` pairs of every named hidden input
///
/// Inputs without a `name` are ignored; a missing `value` becomes empty.
pub fn hidden_fields(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);

    document
        .select(hidden_input())
        .filter_map(|input| {
            let element = input.value();
            let name = element.attr("name").filter(|n| !n.is_empty())?;
            let value = element.attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
