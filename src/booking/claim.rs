//! Two-phase reservation against one candidate
//!
//! Phase 1 asks the service whether the slot can still be reserved by this
//! member. Phase 2 submits the reservation with timestamps taken from the
//! corrected service clock. Neither phase retries; the orchestrator decides
//! what to do with a failed attempt.

use serde::Deserialize;
use serde_json::Value;

use crate::client::headers::ACCEPT_JSON;
use crate::client::CountySession;
use crate::error::{Error, Result};
use crate::models::{AttemptOutcome, Candidate, Confirmation};
use crate::scheduler::ClockOffset;
use crate::utils::json_text;

/// Phase 1 eligibility check
pub const CHECK_PATH: &str = "/reserve/checkReserveTeetimeAble";

/// Phase 2 submission
pub const SUBMIT_PATH: &str = "/reserve/postReserveConfirmSubmit";

/// Referer the service expects on submission
pub const CONFIRM_PAGE_PATH: &str = "/reserve/confirm";

/// `accountId` sent with the submission; the service resolves the member
/// from the session cookie
pub const SUBMIT_ACCOUNT_ID: &str = "1";

/// Players per reservation
pub const PLAYER_COUNT: &str = "4";

/// Identifier shown when a confirmation field is missing
const NOT_AVAILABLE: &str = "N/A";

/// Service messages meaning another member already holds the slot or it is closed
const SLOT_GONE_PHRASES: &[&str] = &["이미 예약되어 있습니다", "마감되었습니다"];

/// Lowercase English markers, matched as whole words
const SLOT_GONE_WORDS: &[&str] = &["already booked", "closed"];

/// How a failed attempt should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The slot is taken or closed; retrying it is pointless
    SlotGone,
    /// Anything else; the same candidate may be tried again
    Retryable,
}

/// Classify a failure message from an attempt
pub fn classify_failure(message: &str) -> FailureClass {
    let lowered = message.to_lowercase();
    let gone = SLOT_GONE_PHRASES.iter().any(|phrase| message.contains(phrase))
        || SLOT_GONE_WORDS.iter().any(|word| contains_word(&lowered, word));
    if gone {
        FailureClass::SlotGone
    } else {
        FailureClass::Retryable
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Common JSON envelope of the reservation endpoints
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    message: Value,
    #[serde(default, rename = "resultCode")]
    result_code: Value,
    #[serde(default)]
    data: Value,
}

impl ApiReply {
    fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    fn is_ok(&self) -> bool {
        self.result.as_i64() == Some(0) && self.data.get("success") == Some(&Value::Bool(true))
    }

    fn message(&self) -> Option<String> {
        self.message
            .as_str()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
    }

    fn completion(&self) -> Option<&serde_json::Map<String, Value>> {
        match self.data.get("reserveCompleteInfo") {
            Some(Value::Object(info)) if !info.is_empty() => Some(info),
            _ => None,
        }
    }
}

/// Performs claim attempts
#[derive(Debug, Clone, Default)]
pub struct ClaimAttempt;

impl ClaimAttempt {
    pub fn new() -> Self {
        Self
    }

    /// Try to reserve `candidate` for `date` (`YYYYMMDD`)
    ///
    /// Never fails: every problem is folded into the outcome message, which
    /// carries the server's own wording when it gave one.
    pub async fn attempt(
        &self,
        session: &CountySession,
        date: &str,
        candidate: &Candidate,
        offset: &ClockOffset,
    ) -> AttemptOutcome {
        tracing::debug!(slot_id = %candidate.slot_id, "Checking slot eligibility");
        if let Err(e) = self.check(session, candidate).await {
            tracing::warn!(candidate = %candidate, error = %e, "Eligibility check failed");
            return AttemptOutcome::failed(failure_message("eligibility check failed", e));
        }

        tracing::debug!(slot_id = %candidate.slot_id, "Submitting reservation");
        match self.submit(session, date, candidate, offset).await {
            Ok(confirmation) => {
                tracing::info!(
                    candidate = %candidate,
                    reservation_id = %confirmation.reservation_id,
                    reservation_no = %confirmation.reservation_no,
                    "Reservation complete"
                );
                AttemptOutcome::booked(confirmation)
            }
            Err(Error::AlreadyClaimed(message)) | Err(Error::Protocol(message)) => {
                tracing::warn!(candidate = %candidate, message = %message, "Reservation rejected");
                AttemptOutcome::failed(message)
            }
            Err(e) => {
                tracing::warn!(candidate = %candidate, error = %e, "Reservation request failed");
                AttemptOutcome::failed(failure_message("submission failed", e))
            }
        }
    }

    async fn check(&self, session: &CountySession, candidate: &Candidate) -> Result<()> {
        let url = session.endpoint(CHECK_PATH)?;
        let referer = session.teetime_page()?;
        let headers = session.headers(Some(referer.as_str()), ACCEPT_JSON);
        let query = [
            ("golfclubSeq", session.club_seq()),
            ("accountId", session.member_id().unwrap_or_default()),
            ("timeTableId", candidate.slot_id.as_str()),
            ("reserveOrderType", ""),
            ("timeTableHasBookgInfoId", ""),
        ];

        let reply = session
            .get_with_query(url, headers, &query, session.request_timeout())
            .await?;
        if !reply.is_json() {
            return Err(Error::protocol(format!(
                "expected JSON, got '{}' (session may have expired)",
                reply.content_type
            )));
        }

        let api = ApiReply::parse(&reply.body)
            .ok_or_else(|| Error::protocol("unreadable eligibility response"))?;
        if api.is_ok() {
            return Ok(());
        }

        Err(rejection(
            api.message()
                .unwrap_or_else(|| format!("unexpected response (resultCode {})", api.result_code)),
        ))
    }

    async fn submit(
        &self,
        session: &CountySession,
        date: &str,
        candidate: &Candidate,
        offset: &ClockOffset,
    ) -> Result<Confirmation> {
        let url = session.endpoint(SUBMIT_PATH)?;
        let referer = session.endpoint(CONFIRM_PAGE_PATH)?;
        let headers = session.headers(Some(referer.as_str()), ACCEPT_JSON);

        let stamp = offset
            .corrected_now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();
        let form = [
            ("bookgDate", date),
            ("accountId", SUBMIT_ACCOUNT_ID),
            ("timeTableId", candidate.slot_id.as_str()),
            ("playPlayerCnt", PLAYER_COUNT),
            ("caddieYn", "Y"),
            ("genderScd", "on"),
            ("eventLockTime", stamp.as_str()),
            ("eventConfirmTime", stamp.as_str()),
            ("eventUserCheckTime", stamp.as_str()),
        ];

        let reply = session
            .post_form(url, headers, &form, session.request_timeout())
            .await?;
        let api = ApiReply::parse(&reply.body).unwrap_or_default();

        if api.is_ok() {
            if let Some(info) = api.completion() {
                let field = |key: &str| {
                    info.get(key)
                        .and_then(json_text)
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
                };
                return Ok(Confirmation {
                    reservation_id: field("bookgInfoId"),
                    reservation_no: field("bookgNo"),
                });
            }
        }

        Err(rejection(
            api.message()
                .unwrap_or_else(|| String::from("server returned no message")),
        ))
    }
}

fn rejection(message: String) -> Error {
    match classify_failure(&message) {
        FailureClass::SlotGone => Error::AlreadyClaimed(message),
        FailureClass::Retryable => Error::Protocol(message),
    }
}

fn failure_message(phase: &str, error: Error) -> String {
    match error {
        Error::AlreadyClaimed(message) | Error::Protocol(message) => format!("{phase}: {message}"),
        other => format!("{phase}: {other}"),
    }
}
