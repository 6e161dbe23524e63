//! HTTP session for the reservation service
//!
//! [`CountySession`] owns the reqwest client and its cookie jar for one run.
//! Only the orchestration task holds it; the keep-alive task gets a
//! [`SessionPinger`], which can issue nothing but the idempotent listing-page
//! GET.

pub mod auth;
pub mod headers;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, CONTENT_TYPE, DATE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::ClientConfig;
use crate::utils::error::FetchError;
use headers::{build_ajax_headers, with_content_type, ACCEPT_HTML};

/// Path of the per-club tee-time page, used for warm-up, keep-alive and as referer
pub const TEETIME_PAGE_PATH: &str = "/reserve/main/teetimeList";

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: String,
    /// Raw `Date` header, if any
    pub date: Option<String>,
    pub body: String,
}

impl Reply {
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html")
    }

    pub fn is_json(&self) -> bool {
        self.content_type.contains("application/json")
    }
}

/// Authenticated session state for one run
pub struct CountySession {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    club_seq: String,
    user_agent: String,
    member_id: Option<String>,
    request_timeout: Duration,
    page_timeout: Duration,
}

impl CountySession {
    /// Create a session from client configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a bad base URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &ClientConfig, club_seq: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .gzip(true)
            .danger_accept_invalid_certs(!config.tls_verify)
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url,
            club_seq: club_seq.into(),
            user_agent: config.user_agent.clone(),
            member_id: None,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            page_timeout: Duration::from_secs(config.page_timeout_secs),
        })
    }

    /// Create a session against a custom base URL with default settings
    ///
    /// Used to point the session at a mock server.
    pub fn with_base_url(base_url: &str, club_seq: impl Into<String>) -> Result<Self, FetchError> {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        };
        Self::new(&config, club_seq)
    }

    pub fn club_seq(&self) -> &str {
        &self.club_seq
    }

    /// Member id learned at login, if login has happened
    pub fn member_id(&self) -> Option<&str> {
        self.member_id.as_deref()
    }

    pub(crate) fn set_member_id(&mut self, member_id: String) {
        self.member_id = Some(member_id);
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn page_timeout(&self) -> Duration {
        self.page_timeout
    }

    /// Resolve a service path against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))
    }

    /// The club's tee-time page
    pub fn teetime_page(&self) -> Result<Url, FetchError> {
        let mut url = self.endpoint(TEETIME_PAGE_PATH)?;
        url.query_pairs_mut()
            .append_pair("golfclubSeq", &self.club_seq);
        Ok(url)
    }

    /// Standard AJAX headers with this session's user agent
    pub fn headers(&self, referer: Option<&str>, accept: &str) -> HeaderMap {
        build_ajax_headers(&self.user_agent, referer, accept)
    }

    /// True when the cookie jar holds a cookie with this name for the service
    pub fn has_cookie(&self, name: &str) -> bool {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
            .map(|cookies| {
                cookies
                    .split(';')
                    .filter_map(|pair| pair.trim().split_once('='))
                    .any(|(key, _)| key == name)
            })
            .unwrap_or(false)
    }

    /// GET a URL
    pub async fn get(
        &self,
        url: Url,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Reply, FetchError> {
        send(self.client.get(url).headers(headers), timeout).await
    }

    /// GET a URL with query parameters
    pub async fn get_with_query<T: Serialize + ?Sized>(
        &self,
        url: Url,
        headers: HeaderMap,
        query: &T,
        timeout: Duration,
    ) -> Result<Reply, FetchError> {
        send(self.client.get(url).headers(headers).query(query), timeout).await
    }

    /// POST a form-encoded body
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: Url,
        headers: HeaderMap,
        form: &T,
        timeout: Duration,
    ) -> Result<Reply, FetchError> {
        send(self.client.post(url).headers(headers).form(form), timeout).await
    }

    /// Open the club's tee-time page once so the server binds the session to it
    pub async fn warm_up(&self) -> Result<Reply, FetchError> {
        let url = self.teetime_page()?;
        let headers = with_content_type(self.headers(None, ACCEPT_HTML), "text/html");
        self.get(url, headers, self.page_timeout).await
    }

    /// Read-only handle for the keep-alive task
    pub fn pinger(&self) -> Result<SessionPinger, FetchError> {
        let url = self.teetime_page()?;
        let headers = with_content_type(
            self.headers(Some(url.as_str()), "*/*"),
            "application/json",
        );
        Ok(SessionPinger {
            client: self.client.clone(),
            url,
            headers,
            timeout: self.request_timeout,
        })
    }
}

/// Read-only view of a session that can only refresh it
///
/// Shares the cookie jar with the owning [`CountySession`].
#[derive(Clone)]
pub struct SessionPinger {
    client: Client,
    url: Url,
    headers: HeaderMap,
    timeout: Duration,
}

impl SessionPinger {
    /// Issue one keep-alive GET
    pub async fn ping(&self) -> Result<StatusCode, FetchError> {
        let reply = send(
            self.client.get(self.url.clone()).headers(self.headers.clone()),
            self.timeout,
        )
        .await?;
        Ok(reply.status)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

async fn send(request: RequestBuilder, timeout: Duration) -> Result<Reply, FetchError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(FetchError::from_transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::ServerError(status.as_u16()));
    }

    let content_type = header_text(response.headers(), CONTENT_TYPE).unwrap_or_default();
    let date = header_text(response.headers(), DATE);

    let body = response.text().await.map_err(FetchError::from_transport)?;

    Ok(Reply {
        status,
        content_type,
        date,
        body,
    })
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
