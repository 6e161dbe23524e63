use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER,
    USER_AGENT,
};

/// `Accept` value for AJAX calls answered with JSON
pub const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";

/// `Accept` value for AJAX calls answered with an HTML fragment
pub const ACCEPT_HTML: &str = "text/html, */*; q=0.01";

/// `Content-Type` of form posts
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Build browser-like AJAX headers for the reservation service
///
/// Every request carries the user agent, the Korean `Accept-Language`,
/// `X-Requested-With` and the form content type the service's own pages send.
/// Cookies are attached by the client's cookie store.
///
/// # Examples
///
/// ```
/// use teeshot::client::headers::{build_ajax_headers, ACCEPT_JSON};
///
/// let headers = build_ajax_headers(
///     "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
///     Some("https://www.golfzoncounty.com/reserve/confirm"),
///     ACCEPT_JSON,
/// );
/// assert!(headers.contains_key("x-requested-with"));
/// ```
pub fn build_ajax_headers(user_agent: &str, referer: Option<&str>, accept: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    if let Some(referer) = referer.and_then(|r| HeaderValue::from_str(r).ok()) {
        headers.insert(REFERER, referer);
    }
    if let Ok(value) = HeaderValue::from_str(accept) {
        headers.insert(ACCEPT, value);
    }
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

    headers
}

/// Replace the content type on an existing header set
pub fn with_content_type(mut headers: HeaderMap, content_type: &'static str) -> HeaderMap {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ajax_headers() {
        let headers = build_ajax_headers("Mozilla/5.0", Some("https://example.com/"), ACCEPT_JSON);

        assert_eq!(
            headers.get(USER_AGENT).unwrap(),
            HeaderValue::from_static("Mozilla/5.0")
        );
        assert_eq!(
            headers.get(REFERER).unwrap(),
            HeaderValue::from_static("https://example.com/")
        );
        assert_eq!(
            headers.get(ACCEPT).unwrap(),
            HeaderValue::from_static(ACCEPT_JSON)
        );
        assert_eq!(
            headers.get("x-requested-with").unwrap(),
            HeaderValue::from_static("XMLHttpRequest")
        );
        assert_eq!(
            headers.get(CONTENT_TYPE).unwrap(),
            HeaderValue::from_static(FORM_CONTENT_TYPE)
        );
    }

    #[test]
    fn test_referer_is_optional() {
        let headers = build_ajax_headers("Mozilla/5.0", None, ACCEPT_HTML);
        assert!(!headers.contains_key(REFERER));
    }

    #[test]
    fn test_invalid_referer_is_skipped() {
        let headers = build_ajax_headers("Mozilla/5.0", Some("bad\nvalue"), ACCEPT_HTML);
        assert!(!headers.contains_key(REFERER));
    }

    #[test]
    fn test_with_content_type() {
        let headers = with_content_type(
            build_ajax_headers("Mozilla/5.0", None, ACCEPT_HTML),
            "text/html",
        );
        assert_eq!(
            headers.get(CONTENT_TYPE).unwrap(),
            HeaderValue::from_static("text/html")
        );
    }
}
