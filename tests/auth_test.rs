//! Login tests against a mock server

mod common;

use common::{html, CLUB_SEQ};
use serde_json::json;
use teeshot::client::CountySession;
use teeshot::error::Error;
use teeshot::models::Credentials;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(query_param("gfsReturn", "/setting/account"))
        .respond_with(
            html(
                r#"<form id="loginForm">
                    <input type="hidden" name="csrf" value="tok-1"/>
                    <input type="hidden" name="returnUrl" value="/setting/account"/>
                    <input type="text" name="userId"/>
                </form>"#,
            )
            .insert_header("Set-Cookie", "JSESSIONID=abc123; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_records_member_id() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/login/userLogin"))
        .and(body_string_contains("userId=golfer"))
        .and(body_string_contains("userPw=secret"))
        .and(body_string_contains("csrf=tok-1"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "0",
            "data": { "userInfo": { "personId": 4242 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    assert!(session.member_id().is_none());

    session
        .login(&Credentials::new("golfer", "secret"))
        .await
        .unwrap();

    assert_eq!(session.member_id(), Some("4242"));
}

#[tokio::test]
async fn test_member_id_falls_back_to_user_id() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/login/userLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 0 })))
        .mount(&server)
        .await;

    let mut session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    session
        .login(&Credentials::new("golfer", "secret"))
        .await
        .unwrap();

    assert_eq!(session.member_id(), Some("golfer"));
}

#[tokio::test]
async fn test_rejected_login() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/login/userLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 2,
            "message": "비밀번호가 일치하지 않습니다"
        })))
        .mount(&server)
        .await;

    let mut session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let result = session.login(&Credentials::new("golfer", "wrong")).await;

    match result {
        Err(Error::Auth(message)) => assert_eq!(message, "비밀번호가 일치하지 않습니다"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(session.member_id().is_none());
}

#[tokio::test]
async fn test_non_json_login_reply() {
    let server = MockServer::start().await;
    mount_login_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/login/userLogin"))
        .respond_with(html("<html><body>점검 중입니다</body></html>"))
        .mount(&server)
        .await;

    let mut session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let result = session.login(&Credentials::new("golfer", "secret")).await;

    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_login_page_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut session = CountySession::with_base_url(&server.uri(), CLUB_SEQ).unwrap();
    let result = session.login(&Credentials::new("golfer", "secret")).await;

    assert!(matches!(result, Err(Error::Fetch(_))));
}
