//! Login flow
//!
//! The service logs in over AJAX in two steps: the login page is loaded to
//! obtain the session cookie and any hidden form fields, then the credentials
//! are posted together with those fields and the JSON answer is checked.

use serde_json::Value;

use super::headers::{with_content_type, ACCEPT_HTML, ACCEPT_JSON};
use super::CountySession;
use crate::error::{Error, Result};
use crate::models::Credentials;
use crate::parser::hidden_fields;
use crate::utils::{json_text, truncate_text};

/// Login page, loaded first for cookies and hidden fields
pub const LOGIN_PAGE_PATH: &str = "/login?gfsReturn=/setting/account";

/// AJAX login endpoint
pub const LOGIN_POST_PATH: &str = "/login/userLogin";

/// Session cookie the login page is expected to set
pub const SESSION_COOKIE: &str = "JSESSIONID";

impl CountySession {
    /// Authenticate and remember the member id for the claim phases
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` when either request fails at the transport level
    /// and `Error::Auth` when the service rejects the login or answers with
    /// something other than the expected JSON.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let page_url = self.endpoint(LOGIN_PAGE_PATH)?;
        let page_headers = with_content_type(self.headers(None, ACCEPT_HTML), "text/html");

        tracing::debug!(url = %page_url, "Loading login page");
        let page = self
            .get(page_url.clone(), page_headers, self.page_timeout())
            .await?;

        let hidden = hidden_fields(&page.body);
        if self.has_cookie(SESSION_COOKIE) {
            tracing::debug!("Session cookie obtained from login page");
        } else {
            tracing::warn!(cookie = SESSION_COOKIE, "Login page did not set a session cookie");
        }
        if !hidden.is_empty() {
            tracing::debug!(
                fields = ?hidden.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                "Collected hidden login fields"
            );
        }

        let form = login_form(credentials, hidden);
        let post_url = self.endpoint(LOGIN_POST_PATH)?;
        let post_headers = self.headers(Some(page_url.as_str()), ACCEPT_JSON);

        let reply = self
            .post_form(post_url, post_headers, &form, self.request_timeout())
            .await?;

        let body: Value = serde_json::from_str(&reply.body).map_err(|_| {
            Error::Auth(format!(
                "unexpected login response: {}",
                truncate_text(&reply.body, 200)
            ))
        })?;

        if !is_success_code(&body["result"]) {
            let message = body["message"]
                .as_str()
                .unwrap_or("login rejected")
                .to_string();
            tracing::error!(message = %message, "Login rejected");
            return Err(Error::Auth(message));
        }

        let member_id = json_text(&body["data"]["userInfo"]["personId"])
            .unwrap_or_else(|| credentials.user_id.clone());
        tracing::info!(member_id = %member_id, "Logged in");
        self.set_member_id(member_id);

        Ok(())
    }
}

/// Credentials plus hidden fields; hidden fields win on a name clash
fn login_form(credentials: &Credentials, hidden: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut form = vec![
        ("userId".to_string(), credentials.user_id.clone()),
        ("userPw".to_string(), credentials.password.clone()),
    ];

    for (name, value) in hidden {
        match form.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => form.push((name, value)),
        }
    }

    form
}

/// The login endpoint reports success as `0`, sometimes as the string `"0"`
fn is_success_code(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => s.trim() == "0",
        _ => false,
    }
}
