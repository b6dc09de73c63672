mod common;

use common::{contact_json, TestApp, CONTACT_ID, TENANT_ID};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn lists_contacts_alphabetically() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Contacts"))
        .and(header("xero-tenant-id", TENANT_ID))
        .and(query_param("order", "Name ASC"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Contacts": [contact_json("City Agency")]
        })))
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app
        .get(&format!("/api/xero/contacts?organizationId={}&page=2", TENANT_ID))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["contacts"][0]["contactId"], CONTACT_ID);
    assert_eq!(body["contacts"][0]["name"], "City Agency");
    assert_eq!(body["contacts"][0]["emailAddress"], "accounts@cityagency.example");
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn contact_search_matches_name_or_email() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Contacts"))
        .and(query_param(
            "where",
            r#"(Name.Contains("city") OR EmailAddress.Contains("city"))"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Contacts": [] })))
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app
        .get(&format!("/api/xero/contacts?organizationId={}&search=city", TENANT_ID))
        .await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn fetches_single_contact() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("GET"))
        .and(path(format!("/api.xro/2.0/Contacts/{}", CONTACT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Contacts": [contact_json("City Agency")]
        })))
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app
        .get(&format!(
            "/api/xero/contacts/{}?organizationId={}",
            CONTACT_ID, TENANT_ID
        ))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["contact"]["firstName"], "Sam");
}

#[tokio::test]
async fn empty_contact_result_is_not_found() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("GET"))
        .and(path(format!("/api.xro/2.0/Contacts/{}", CONTACT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Contacts": [] })))
        .mount(&app.xero)
        .await;

    let response = app
        .get(&format!(
            "/api/xero/contacts/{}?organizationId={}",
            CONTACT_ID, TENANT_ID
        ))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn creates_contact_with_put() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("PUT"))
        .and(path("/api.xro/2.0/Contacts"))
        .and(header("xero-tenant-id", TENANT_ID))
        .and(body_json(json!({
            "Contacts": [{ "Name": "New Co", "EmailAddress": "hello@newco.example" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Contacts": [contact_json("New Co")]
        })))
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app
        .client
        .post(app.url(&format!("/api/xero/contacts?organizationId={}", TENANT_ID)))
        .json(&json!({ "name": "New Co", "emailAddress": "hello@newco.example" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["contact"]["name"], "New Co");
}

#[tokio::test]
async fn contact_without_name_is_rejected() {
    let app = TestApp::spawn().await;
    app.login().await;

    let response = app
        .client
        .post(app.url(&format!("/api/xero/contacts?organizationId={}", TENANT_ID)))
        .json(&json!({ "emailAddress": "nobody@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn updates_contact_with_post() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("POST"))
        .and(path(format!("/api.xro/2.0/Contacts/{}", CONTACT_ID)))
        .and(body_json(json!({ "Contacts": [{ "FirstName": "Alex" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Contacts": [contact_json("City Agency")]
        })))
        .expect(1)
        .mount(&app.xero)
        .await;

    let response = app
        .client
        .patch(app.url(&format!(
            "/api/xero/contacts/{}?organizationId={}",
            CONTACT_ID, TENANT_ID
        )))
        .json(&json!({ "firstName": "Alex" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn provider_validation_error_carries_body() {
    let app = TestApp::spawn().await;
    app.login().await;

    Mock::given(method("PUT"))
        .and(path("/api.xro/2.0/Contacts"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("A validation exception occurred"),
        )
        .mount(&app.xero)
        .await;

    let response = app
        .client
        .post(app.url(&format!("/api/xero/contacts?organizationId={}", TENANT_ID)))
        .json(&json!({ "name": "Dup Co" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Xero API error: A validation exception occurred");
}
