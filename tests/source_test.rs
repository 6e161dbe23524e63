//! Listing fetch tests against a mock server

mod common;

use common::{empty_listing, html, listing_page, listing_row, CLAIM_DATE, CLUB_SEQ};
use std::time::Duration;
use teeshot::booking::{CandidateSource, SourceSettings};
use teeshot::client::CountySession;
use teeshot::error::Error;
use teeshot::utils::error::FetchError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/reserve/golfclub/teetime/getList";

fn source(attempts: u32) -> CandidateSource {
    CandidateSource::new(SourceSettings {
        pages: 4,
        page_timeout: Duration::from_millis(500),
        attempts,
        min_len: 100,
    })
}

fn page_one() -> String {
    listing_page(&[
        listing_row("0700", "101", "A", "OUT"),
        listing_row("0708", "102", "B", "IN"),
    ])
}

#[tokio::test]
async fn test_short_page_ends_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=1"))
        .and(body_string_contains(format!("selectDate={CLAIM_DATE}")))
        .and(body_string_contains("searchFlag=Y"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(html(page_one()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=2"))
        .respond_with(html(empty_listing()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=3"))
        .respond_with(html(page_one()))
        .expect(0)
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let document = source(3)
        .fetch(&session, CLAIM_DATE, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(document.pages(), 1);
    assert!(document.reached_end());
    assert!(document.body().contains("data-time-table-id=\"102\""));
}

#[tokio::test]
async fn test_non_html_reply_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": 9})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=1"))
        .respond_with(html(page_one()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=2"))
        .respond_with(html(""))
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let document = source(3)
        .fetch(&session, CLAIM_DATE, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(document.pages(), 1);
    assert!(document.skipped().is_empty());
}

#[tokio::test]
async fn test_failing_page_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=2"))
        .respond_with(html(page_one()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING))
        .and(body_string_contains("pageNo=3"))
        .respond_with(html(empty_listing()))
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let document = source(2)
        .fetch(&session, CLAIM_DATE, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(document.pages(), 1);
    assert_eq!(document.skipped(), &[1]);
    assert!(document.reached_end());
}

#[tokio::test]
async fn test_every_page_failing_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let result = source(1)
        .fetch(&session, CLAIM_DATE, &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(Error::Fetch(FetchError::AllPagesFailed { pages: 4 }))
    ));
}

#[tokio::test]
async fn test_empty_first_page_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .respond_with(html(empty_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let document = source(3)
        .fetch(&session, CLAIM_DATE, &CancellationToken::new())
        .await
        .unwrap();

    assert!(document.is_empty());
    assert!(document.reached_end());
}

#[tokio::test]
async fn test_cancelled_fetch_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .respond_with(html(page_one()))
        .expect(0)
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = source(3).fetch(&session, CLAIM_DATE, &cancel).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_cancel_abandons_slow_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LISTING))
        .respond_with(html(page_one()).set_delay(Duration::from_secs(8)))
        .mount(&server)
        .await;

    let session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let slow_pages = CandidateSource::new(SourceSettings {
        pages: 4,
        page_timeout: Duration::from_secs(10),
        attempts: 3,
        min_len: 100,
    });
    let started = std::time::Instant::now();
    let result = slow_pages.fetch(&session, CLAIM_DATE, &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(1));
}
