mod common;

use std::time::Duration;

use common::{connections_json, rotated_tokens, TestApp};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

// Test settings give every outbound call a 2s budget
const SLOW: Duration = Duration::from_secs(4);

#[tokio::test]
async fn slow_api_call_times_out_without_retry() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("GET"))
        .and(path("/connections"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(connections_json())
                .set_delay(SLOW),
        )
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app.get("/api/xero/organizations").await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Xero request timed out");
}

#[tokio::test]
async fn slow_refresh_times_out_and_keeps_the_session() {
    let app = TestApp::spawn().await;
    app.login_with_expiry(0).await;

    TestApp::refresh_grant()
        .respond_with(rotated_tokens().set_delay(SLOW))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app.get("/api/xero/organizations").await;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Xero request timed out");

    // The refresh token was not spent, so the next request can still refresh
    TestApp::refresh_grant()
        .respond_with(rotated_tokens())
        .expect(1)
        .mount(&app.xero)
        .await;
    Mock::given(method("GET"))
        .and(path("/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(connections_json()))
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app.get("/api/xero/organizations").await;
    assert_eq!(response.status().as_u16(), 200);
}
