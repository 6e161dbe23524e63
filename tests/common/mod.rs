//! Common test utilities

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;
use std::time::Duration;
use teeshot::booking::{RunSettings, SourceSettings};
use teeshot::config::ClientConfig;
use teeshot::models::{CategoryFilter, SortOrder, TargetConfig, TimeWindow};
use teeshot::utils::kst;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLUB_SEQ: &str = "1";
pub const CLAIM_DATE: &str = "20261117";

/// One bookable listing row
pub fn listing_row(time: &str, slot_id: &str, course_code: &str, course_name: &str) -> String {
    format!(
        r#"<li class="teetime" onclick="teetimeReserveConfirm(this)" data-bookg-time="{time}" data-time-table-id="{slot_id}" data-course-cd-code="{course_code}">
    <div class="info"><span>{course_name}</span><em>18홀 / 4인</em></div>
    <div class="price">180,000원</div>
</li>"#
    )
}

/// A listing page fragment from rows
pub fn listing_page(rows: &[String]) -> String {
    format!("<ul class=\"teetime-list\">\n{}\n</ul>", rows.join("\n"))
}

/// Body a listing page returns when there is nothing left
pub fn empty_listing() -> String {
    String::from("<ul></ul>")
}

pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html;charset=UTF-8")
}

/// Login page plus a successful login endpoint
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            html(r#"<html><body><form><input type="hidden" name="csrf" value="abc"/></form></body></html>"#)
                .insert_header("Set-Cookie", "JSESSIONID=session-1; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login/userLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 0,
            "message": "",
            "data": { "userInfo": { "personId": "P-777" } }
        })))
        .mount(server)
        .await;
}

/// Tee-time page used for warm-up and keep-alive
pub async fn mount_teetime_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/reserve/main/teetimeList"))
        .respond_with(html("<html><body>tee times</body></html>"))
        .mount(server)
        .await;
}

pub fn check_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": 0,
        "resultCode": "0000",
        "data": { "success": true }
    }))
}

pub fn submit_ok(reservation_id: u64, reservation_no: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": 0,
        "data": {
            "success": true,
            "reserveCompleteInfo": { "bookgInfoId": reservation_id, "bookgNo": reservation_no }
        }
    }))
}

pub fn submit_rejected(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": 1,
        "message": message,
        "data": { "success": false }
    }))
}

pub fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        request_timeout_secs: 2,
        page_timeout_secs: 2,
        ..ClientConfig::default()
    }
}

/// Settings that keep a full run within a few seconds
pub fn fast_settings() -> RunSettings {
    RunSettings {
        settle_delay: Duration::ZERO,
        clock_attempts: 1,
        clock_retry_pause: Duration::from_millis(10),
        keepalive_interval: Duration::from_millis(200),
        keepalive_tick: Duration::from_millis(20),
        listing: SourceSettings {
            pages: 4,
            page_timeout: Duration::from_secs(1),
            attempts: 2,
            min_len: 100,
        },
        claim_retry_pause: Duration::from_millis(50),
        ..RunSettings::default()
    }
}

/// KST wall-clock time of a UTC instant
pub fn kst_naive(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&kst()).naive_local()
}

/// Target opening at `run_at` for the whole day, any course, earliest first
pub fn target(run_at: DateTime<Utc>, dry_run: bool) -> TargetConfig {
    TargetConfig {
        club_seq: CLUB_SEQ.to_string(),
        claim_date: NaiveDate::parse_from_str(CLAIM_DATE, "%Y%m%d").unwrap(),
        run_at: kst_naive(run_at),
        window: TimeWindow::new("06:00", "20:00").unwrap(),
        category: CategoryFilter::Any,
        order: SortOrder::Asc,
        attempt_delay: Duration::ZERO,
        dry_run,
    }
}
