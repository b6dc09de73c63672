//! Session-scoped gateway to the Xero Accounting API.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use service_core::observability::TracedClientExt;
use uuid::Uuid;

use crate::config::XeroSettings;
use crate::error::XeroError;
use crate::models::contact::ContactsEnvelope;
use crate::models::invoice::InvoicesEnvelope;
use crate::models::{Contact, ContactDraft, Invoice, InvoiceUpdate, Organization};
use crate::services::filter::{ContactQuery, InvoiceQuery};
use crate::services::metrics;
use crate::services::token_manager::TokenManager;

/// Header scoping a call to one organization.
pub const TENANT_HEADER: &str = "xero-tenant-id";

/// One outbound call, kept whole so it can be resent after a refresh.
struct ApiCall<'a> {
    method: Method,
    url: String,
    /// Low-cardinality label for metrics.
    endpoint: &'static str,
    tenant_id: Option<&'a str>,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl<'a> ApiCall<'a> {
    fn new(method: Method, url: String, endpoint: &'static str) -> Self {
        Self {
            method,
            url,
            endpoint,
            tenant_id: None,
            query: Vec::new(),
            body: None,
        }
    }

    fn tenant(mut self, tenant_id: &'a str) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    fn query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    fn json<T: Serialize>(mut self, body: &T) -> Result<Self, XeroError> {
        let value = serde_json::to_value(body).map_err(|e| XeroError::Decode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }
}

#[derive(Serialize)]
struct InvoicesBody<'a> {
    #[serde(rename = "Invoices")]
    invoices: [&'a InvoiceUpdate; 1],
}

#[derive(Serialize)]
struct ContactsBody<'a> {
    #[serde(rename = "Contacts")]
    contacts: [&'a ContactDraft; 1],
}

/// Client bound to one session's [`TokenManager`].
///
/// Cheap to build; handlers create one per request.
pub struct XeroClient {
    http: Client,
    settings: Arc<XeroSettings>,
    tokens: Arc<TokenManager>,
}

impl XeroClient {
    pub fn new(http: Client, settings: Arc<XeroSettings>, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            settings,
            tokens,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base_url.trim_end_matches('/'), path)
    }

    /// Organizations (tenants) the current token has been granted.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, XeroError> {
        let call = ApiCall::new(
            Method::GET,
            self.settings.connections_url.clone(),
            "connections",
        );
        self.send_json(call).await
    }

    pub async fn list_invoices(
        &self,
        tenant_id: &str,
        query: &InvoiceQuery,
    ) -> Result<Vec<Invoice>, XeroError> {
        let call = ApiCall::new(Method::GET, self.api_url("Invoices"), "invoices")
            .tenant(tenant_id)
            .query(query.to_params());
        let envelope: InvoicesEnvelope = self.send_json(call).await?;
        Ok(envelope.invoices)
    }

    pub async fn get_invoice(&self, tenant_id: &str, invoice_id: &str) -> Result<Invoice, XeroError> {
        let id = entity_id(invoice_id)?;
        let call = ApiCall::new(
            Method::GET,
            self.api_url(&format!("Invoices/{}", id)),
            "invoice",
        )
        .tenant(tenant_id);
        let envelope: InvoicesEnvelope = self.send_json(call).await?;
        first(envelope.invoices, "Invoice")
    }

    pub async fn update_invoice(
        &self,
        tenant_id: &str,
        invoice_id: &str,
        update: &InvoiceUpdate,
    ) -> Result<Invoice, XeroError> {
        let id = entity_id(invoice_id)?;
        let call = ApiCall::new(
            Method::POST,
            self.api_url(&format!("Invoices/{}", id)),
            "invoice",
        )
        .tenant(tenant_id)
        .json(&InvoicesBody { invoices: [update] })?;
        let envelope: InvoicesEnvelope = self.send_json(call).await?;
        first(envelope.invoices, "Invoice")
    }

    pub async fn list_contacts(
        &self,
        tenant_id: &str,
        query: &ContactQuery,
    ) -> Result<Vec<Contact>, XeroError> {
        let call = ApiCall::new(Method::GET, self.api_url("Contacts"), "contacts")
            .tenant(tenant_id)
            .query(query.to_params());
        let envelope: ContactsEnvelope = self.send_json(call).await?;
        Ok(envelope.contacts)
    }

    pub async fn get_contact(&self, tenant_id: &str, contact_id: &str) -> Result<Contact, XeroError> {
        let id = entity_id(contact_id)?;
        let call = ApiCall::new(
            Method::GET,
            self.api_url(&format!("Contacts/{}", id)),
            "contact",
        )
        .tenant(tenant_id);
        let envelope: ContactsEnvelope = self.send_json(call).await?;
        first(envelope.contacts, "Contact")
    }

    pub async fn update_contact(
        &self,
        tenant_id: &str,
        contact_id: &str,
        draft: &ContactDraft,
    ) -> Result<Contact, XeroError> {
        let id = entity_id(contact_id)?;
        let call = ApiCall::new(
            Method::POST,
            self.api_url(&format!("Contacts/{}", id)),
            "contact",
        )
        .tenant(tenant_id)
        .json(&ContactsBody { contacts: [draft] })?;
        let envelope: ContactsEnvelope = self.send_json(call).await?;
        first(envelope.contacts, "Contact")
    }

    pub async fn create_contact(
        &self,
        tenant_id: &str,
        draft: &ContactDraft,
    ) -> Result<Contact, XeroError> {
        let call = ApiCall::new(Method::PUT, self.api_url("Contacts"), "contacts")
            .tenant(tenant_id)
            .json(&ContactsBody { contacts: [draft] })?;
        let envelope: ContactsEnvelope = self.send_json(call).await?;
        first(envelope.contacts, "Contact")
    }

    async fn send_json<T: DeserializeOwned>(&self, call: ApiCall<'_>) -> Result<T, XeroError> {
        let response = self.send(&call).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| XeroError::Decode(format!("{} response: {}", call.endpoint, e)))
    }

    /// Send `call`, refreshing and resending once if Xero answers `401`.
    async fn send(&self, call: &ApiCall<'_>) -> Result<reqwest::Response, XeroError> {
        if let Some(tenant_id) = call.tenant_id {
            if tenant_id.trim().is_empty() {
                return Err(XeroError::MissingOrganization);
            }
        }

        let token = self.tokens.access_token().await?;
        let response = self.dispatch(call, &token.value).await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(
                endpoint = call.endpoint,
                "Xero rejected access token, refreshing and retrying once"
            );
            let pair = self.tokens.refresh_after(token.generation).await?;
            self.dispatch(call, pair.access_token()).await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                endpoint = call.endpoint,
                status = %status,
                body = %body,
                "Xero API request failed"
            );
            return Err(XeroError::ProviderRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn dispatch(
        &self,
        call: &ApiCall<'_>,
        access_token: &str,
    ) -> Result<reqwest::Response, XeroError> {
        let mut request = self
            .http
            .traced(call.method.clone(), &call.url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .timeout(self.settings.request_timeout());

        if let Some(tenant_id) = call.tenant_id {
            request = request.header(TENANT_HEADER, tenant_id);
        }
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let result = request.send().await;
        let status = result.as_ref().map_or(0, |r| r.status().as_u16());
        metrics::record_xero_call(call.endpoint, status);

        Ok(result?)
    }
}

/// Xero ids are GUIDs; anything else never reaches a URL path.
fn entity_id(raw: &str) -> Result<Uuid, XeroError> {
    Uuid::parse_str(raw.trim()).map_err(|_| XeroError::InvalidEntityId(raw.to_string()))
}

fn first<T>(items: Vec<T>, kind: &str) -> Result<T, XeroError> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| XeroError::NotFound(kind.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_must_be_guids() {
        assert!(entity_id("0b9c6f0e-3c2a-4d7e-9a4b-2f1f7c1d5e6a").is_ok());
        assert!(matches!(
            entity_id("../Contacts"),
            Err(XeroError::InvalidEntityId(_))
        ));
        assert!(matches!(entity_id(""), Err(XeroError::InvalidEntityId(_))));
    }

    #[test]
    fn update_body_wraps_in_envelope() {
        let update = InvoiceUpdate {
            reference: Some("PO-7".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(InvoicesBody { invoices: [&update] }).unwrap();
        assert_eq!(body, serde_json::json!({"Invoices": [{"Reference": "PO-7"}]}));
    }
}
