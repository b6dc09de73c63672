#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashboard_service::config::{ServerSettings, Settings, TelemetrySettings, XeroSettings};
use dashboard_service::services::metrics::init_metrics;
use dashboard_service::startup::Application;
use reqwest::{redirect::Policy, Client, Response};
use secrecy::Secret;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "test-client-id";
pub const TENANT_ID: &str = "70784a63-d24b-46a9-a4db-0e70a274b056";
pub const INVOICE_ID: &str = "243216c5-369e-4056-ac67-05388f86dc81";
pub const CONTACT_ID: &str = "025867f1-d741-4d6b-b1af-9ac774b59ba7";

pub const ACCESS_TOKEN: &str = "access-1";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const ROTATED_ACCESS_TOKEN: &str = "access-2";
pub const ROTATED_REFRESH_TOKEN: &str = "refresh-2";

/// The application on a random port with Xero replaced by a mock server.
pub struct TestApp {
    pub address: String,
    pub xero: MockServer,
    /// Browser stand-in: keeps cookies, never follows redirects.
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_metrics();

        let xero = MockServer::start().await;

        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 0,
                cookie_secure: false,
                session_inactivity_hours: 1,
            },
            xero: XeroSettings {
                client_id: CLIENT_ID.to_string(),
                client_secret: Secret::new("test-client-secret".to_string()),
                redirect_uri: "http://127.0.0.1/auth/xero/callback".to_string(),
                identity_url: xero.uri(),
                api_base_url: format!("{}/api.xro/2.0", xero.uri()),
                connections_url: format!("{}/connections", xero.uri()),
                scopes: "openid profile email accounting.transactions offline_access".to_string(),
                request_timeout_secs: 2,
            },
            telemetry: TelemetrySettings::default(),
        };

        let app = Application::build(settings)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to build test client");

        TestApp {
            address,
            xero,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Start a login and return the `state` Xero would echo back.
    pub async fn begin_login(&self) -> String {
        let response = self.get("/auth/xero/login").await;
        assert_eq!(response.status().as_u16(), 303);

        let location = response.headers()["location"].to_str().unwrap().to_string();
        let url = reqwest::Url::parse(&location).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("authorize URL has no state")
    }

    /// Full sign-in with an access token valid for `expires_in` seconds.
    pub async fn login_with_expiry(&self, expires_in: i64) {
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": ACCESS_TOKEN,
                "refresh_token": REFRESH_TOKEN,
                "expires_in": expires_in,
                "token_type": "Bearer",
                "id_token": id_token(),
            })))
            .mount(&self.xero)
            .await;

        let state = self.begin_login().await;
        let response = self
            .get(&format!("/auth/xero/callback?code=auth-code&state={}", state))
            .await;

        assert_eq!(response.status().as_u16(), 303);
        assert_eq!(response.headers()["location"], "/dashboard");
    }

    pub async fn login(&self) {
        self.login_with_expiry(1800).await;
    }

    /// Token endpoint, refresh grant for the pair issued at login.
    pub fn refresh_grant() -> MockBuilder {
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains(format!("refresh_token={}", REFRESH_TOKEN)))
    }
}

pub fn rotated_tokens() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": ROTATED_ACCESS_TOKEN,
        "refresh_token": ROTATED_REFRESH_TOKEN,
        "expires_in": 1800,
        "token_type": "Bearer",
    }))
}

/// Unsigned ID token; only the payload is read.
pub fn id_token() -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": "user-1",
            "email": "jane@example.com",
            "given_name": "Jane",
            "family_name": "Doe",
            "xero_userid": "xu-1",
        })
        .to_string(),
    );
    format!("{}.{}.signature", header, claims)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn invoice_json(number: &str, status: &str) -> Value {
    json!({
        "Type": "ACCREC",
        "InvoiceID": INVOICE_ID,
        "InvoiceNumber": number,
        "Reference": "PO-1",
        "Contact": { "ContactID": CONTACT_ID, "Name": "City Agency" },
        "Date": "/Date(1518685950940+0000)/",
        "DueDate": "/Date(1519290750940+0000)/",
        "Status": status,
        "LineAmountTypes": "Exclusive",
        "LineItems": [{
            "LineItemID": "52208ff9-528a-4985-a9ad-b2b1d4210e38",
            "Description": "Consulting",
            "Quantity": 1.0,
            "UnitAmount": 100.00,
            "AccountCode": "200",
            "TaxType": "OUTPUT2",
            "LineAmount": 100.00
        }],
        "SubTotal": 100.00,
        "TotalTax": 15.00,
        "Total": 115.00,
        "AmountDue": 115.00,
        "AmountPaid": 0.00,
        "CurrencyCode": "NZD",
        "UpdatedDateUTC": "/Date(1518685950940+0000)/"
    })
}

pub fn contact_json(name: &str) -> Value {
    json!({
        "ContactID": CONTACT_ID,
        "Name": name,
        "EmailAddress": "accounts@cityagency.example",
        "FirstName": "Sam",
        "LastName": "Lee",
        "ContactPersons": [],
        "Addresses": [],
        "UpdatedDateUTC": "/Date(1518685950940+0000)/"
    })
}

pub fn connections_json() -> Value {
    json!([{
        "id": "e1eede29-f875-4a5d-8470-17f6a29a88b1",
        "authEventId": "d99ecdfe-391d-43d2-b834-17636ba90e8d",
        "tenantId": TENANT_ID,
        "tenantType": "ORGANISATION",
        "tenantName": "Demo Company (NZ)",
        "createdDateUtc": "2019-07-09T23:40:30.1833130",
        "updatedDateUtc": "2020-05-15T01:35:13.8491980"
    }])
}
